//! Payment webhook reconciliation: the sole source of truth for marking an
//! order paid.
//!
//! The endpoint is internet-reachable and unauthenticated by default, so the
//! flow fails closed: the raw body is verified against the provider's HMAC
//! signature before any parsing, and an unverified payload never mutates
//! order state. The completion write is a full upsert keyed by session id,
//! which makes at-least-once delivery and the provisional-write race both
//! converge: redelivering the same event is a no-op in effect, and a missing
//! provisional record is simply created from the event payload.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{OrderRecord, OrderStatus};
use crate::services::order_repo::OrderRepository;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the provider's signature over the raw body.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// The one event type that triggers a write. Everything else is acknowledged
/// and ignored so the provider does not retry it needlessly.
pub const COMPLETED_EVENT_TYPE: &str = "checkout.completed";

/// Maximum accepted age of a signed payload; older timestamps are treated as
/// replays and rejected.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Builds a `t=<unix>,v1=<hex>` signature header for `payload`. The inverse
/// of [`verify_signature`]; used by the test suites and by local tooling
/// that replays events against a development server.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a `t=<unix>,v1=<hex>` signature header over the raw body.
/// The signed message is `"{t}.{body}"`; comparison is constant-time via the
/// HMAC verifier. Any malformed header, stale timestamp or digest mismatch
/// is an error.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, now: DateTime<Utc>) -> AppResult<()> {
  let mut timestamp: Option<i64> = None;
  let mut candidates: Vec<Vec<u8>> = Vec::new();

  for part in header.split(',') {
    match part.trim().split_once('=') {
      Some(("t", value)) => {
        timestamp = value.parse::<i64>().ok();
      }
      Some(("v1", value)) => {
        if let Ok(decoded) = hex::decode(value) {
          candidates.push(decoded);
        }
      }
      // Unknown schemes (e.g. v0) are ignored, as the provider documents.
      _ => {}
    }
  }

  let timestamp = timestamp.ok_or_else(|| AppError::Signature("Missing timestamp in signature header".to_string()))?;
  if candidates.is_empty() {
    return Err(AppError::Signature("No v1 signature in signature header".to_string()));
  }

  let age = (now.timestamp() - timestamp).abs();
  if age > SIGNATURE_TOLERANCE_SECS {
    return Err(AppError::Signature(format!(
      "Signature timestamp outside tolerance ({}s old)",
      age
    )));
  }

  for candidate in &candidates {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    if mac.verify_slice(candidate).is_ok() {
      return Ok(());
    }
  }

  Err(AppError::Signature("Signature does not match payload".to_string()))
}

// Wire shape of a provider event. Only the fields the reconciler reads.
#[derive(Debug, Deserialize)]
struct WireEvent {
  #[serde(rename = "type")]
  event_type: String,
  data: WireEventData,
}

#[derive(Debug, Deserialize)]
struct WireEventData {
  object: WireEventSession,
}

#[derive(Debug, Deserialize)]
struct WireEventSession {
  id: String,
  #[serde(default)]
  customer_details: Option<WireEventCustomer>,
  #[serde(default)]
  amount_total: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireEventCustomer {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
  /// A completion event was verified and the order record durably written.
  Recorded { session_id: String },
  /// A verified event of a type we do not act on; acknowledged so the
  /// provider stops redelivering it.
  Ignored { event_type: String },
}

pub struct WebhookReconciler {
  orders: Arc<dyn OrderRepository>,
  signing_secret: String,
}

impl WebhookReconciler {
  pub fn new(orders: Arc<dyn OrderRepository>, signing_secret: &str) -> Self {
    Self {
      orders,
      signing_secret: signing_secret.to_string(),
    }
  }

  #[instrument(name = "webhook::handle", skip(self, raw_body, signature_header), fields(payload_bytes = raw_body.len()))]
  pub async fn handle(&self, raw_body: &[u8], signature_header: Option<&str>) -> AppResult<WebhookOutcome> {
    self.handle_at(raw_body, signature_header, Utc::now()).await
  }

  /// As [`handle`](Self::handle), with an injectable clock for the
  /// replay-window checks.
  pub async fn handle_at(
    &self,
    raw_body: &[u8],
    signature_header: Option<&str>,
    now: DateTime<Utc>,
  ) -> AppResult<WebhookOutcome> {
    // Step 1: authenticity, over the raw (unparsed) body. Fails closed.
    let header =
      signature_header.ok_or_else(|| AppError::Signature("Missing signature header".to_string()))?;
    verify_signature(raw_body, header, &self.signing_secret, now)?;

    // Step 2: parse and filter. Only terminal success mutates state.
    let event: WireEvent = serde_json::from_slice(raw_body)
      .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {}", e)))?;
    if event.event_type != COMPLETED_EVENT_TYPE {
      info!(event_type = %event.event_type, "Ignoring webhook event type");
      return Ok(WebhookOutcome::Ignored {
        event_type: event.event_type,
      });
    }

    // Step 3: upsert. The provisional record may or may not exist; when it
    // does, its line snapshot and creation time survive the overwrite.
    let session = event.data.object;
    let existing = self.orders.get(&session.id).await?;
    let (items, created_at) = match existing {
      Some(record) => (record.items, record.created_at),
      None => {
        warn!(session_id = %session.id, "No provisional order for completed session; creating from event");
        (Vec::new(), now)
      }
    };

    let (customer_name, email) = match session.customer_details {
      Some(customer) => (customer.name, customer.email),
      None => (None, None),
    };

    let record = OrderRecord {
      session_id: session.id.clone(),
      items,
      status: OrderStatus::Completed,
      customer_name,
      email,
      amount_total_cents: session.amount_total,
      created_at,
      updated_at: now,
    };

    // A failed write must propagate as a server error so the provider
    // redelivers; acknowledging here would lose the event permanently.
    self.orders.put(&record).await?;
    info!(session_id = %session.id, "Order marked completed from webhook");
    Ok(WebhookOutcome::Recorded { session_id: session.id })
  }
}
