//! Payment-provider client: checkout-session creation and retrieval against
//! a Stripe-compatible API, behind a trait so the checkout and order-lookup
//! services can be exercised against a mock.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

use crate::errors::{AppError, Result as AppResult};

/// One line item of a session-creation request. `unit_amount` is in the
/// provider's minor-unit convention (major price multiplied by 100).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
  pub name: String,
  pub currency: String,
  pub unit_amount: i64,
  pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionRequest {
  pub line_items: Vec<SessionLineItem>,
  pub success_url: String,
  pub cancel_url: String,
}

/// What session creation hands back: the opaque session id (primary key for
/// the order record) and the hosted page to redirect the shopper to.
#[derive(Debug, Clone)]
pub struct CreatedSession {
  pub session_id: String,
  pub hosted_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionCustomer {
  pub name: Option<String>,
  pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionLine {
  pub id: String,
  pub name: Option<String>,
  pub quantity: i64,
  /// Line total billed by the provider, minor units.
  pub amount_total: i64,
  pub image: Option<String>,
}

/// The provider's authoritative, real-time view of a session.
#[derive(Debug, Clone)]
pub struct ProviderSession {
  pub session_id: String,
  pub customer: SessionCustomer,
  pub line_items: Vec<SessionLine>,
  /// Session total, minor units.
  pub amount_total: i64,
  pub status: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
  async fn create_session(&self, request: CreateSessionRequest) -> AppResult<CreatedSession>;

  /// Retrieves a session with expanded line items. An unknown, expired or
  /// tampered id is `AppError::NotFound`.
  async fn get_session(&self, session_id: &str) -> AppResult<ProviderSession>;
}

/// Stripe-compatible HTTP client. Every round trip carries the configured
/// timeout so a hung provider call cannot block the calling request.
pub struct HttpPaymentProvider {
  client: reqwest::Client,
  api_base: String,
  secret_key: String,
}

impl HttpPaymentProvider {
  pub fn new(api_base: &str, secret_key: &str, timeout: Duration) -> AppResult<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build payment provider HTTP client: {}", e)))?;
    Ok(Self {
      client,
      api_base: api_base.trim_end_matches('/').to_string(),
      secret_key: secret_key.to_string(),
    })
  }

  fn sessions_url(&self) -> String {
    format!("{}/v1/checkout/sessions", self.api_base)
  }
}

// Wire shapes of the provider's responses. Only the fields the storefront
// reads are modelled.
#[derive(Debug, Deserialize)]
struct WireSession {
  id: String,
  #[serde(default)]
  url: Option<String>,
  #[serde(default)]
  status: Option<String>,
  #[serde(default)]
  amount_total: Option<i64>,
  #[serde(default)]
  customer_details: Option<WireCustomerDetails>,
  #[serde(default)]
  line_items: Option<WireLineItemList>,
}

#[derive(Debug, Deserialize)]
struct WireCustomerDetails {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireLineItemList {
  #[serde(default)]
  data: Vec<WireLineItem>,
}

#[derive(Debug, Deserialize)]
struct WireLineItem {
  id: String,
  #[serde(default)]
  quantity: Option<i64>,
  #[serde(default)]
  amount_total: Option<i64>,
  #[serde(default)]
  price: Option<WirePrice>,
}

#[derive(Debug, Deserialize)]
struct WirePrice {
  #[serde(default)]
  product: Option<WireProduct>,
}

#[derive(Debug, Deserialize)]
struct WireProduct {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
  error: WireErrorBody,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
  #[serde(default)]
  message: Option<String>,
}

async fn provider_error(response: reqwest::Response) -> AppError {
  let status = response.status();
  let message = match response.json::<WireError>().await {
    Ok(body) => body.error.message.unwrap_or_else(|| "unknown provider error".to_string()),
    Err(_) => "unknown provider error".to_string(),
  };
  if status == reqwest::StatusCode::NOT_FOUND {
    AppError::NotFound(format!("Checkout session not found: {}", message))
  } else {
    AppError::Provider(format!("Provider responded {}: {}", status, message))
  }
}

impl From<WireSession> for ProviderSession {
  fn from(wire: WireSession) -> Self {
    let line_items = wire
      .line_items
      .map(|l| l.data)
      .unwrap_or_default()
      .into_iter()
      .map(|item| {
        let product = item.price.and_then(|p| p.product);
        let (name, image) = match product {
          Some(p) => (p.name, p.images.into_iter().next()),
          None => (None, None),
        };
        SessionLine {
          id: item.id,
          name,
          quantity: item.quantity.unwrap_or(1),
          amount_total: item.amount_total.unwrap_or(0),
          image,
        }
      })
      .collect();

    let customer = wire
      .customer_details
      .map(|c| SessionCustomer {
        name: c.name,
        email: c.email,
      })
      .unwrap_or_default();

    ProviderSession {
      session_id: wire.id,
      customer,
      line_items,
      amount_total: wire.amount_total.unwrap_or(0),
      status: wire.status.unwrap_or_else(|| "unknown".to_string()),
    }
  }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
  #[instrument(name = "payments::create_session", skip(self, request), fields(line_count = request.line_items.len()))]
  async fn create_session(&self, request: CreateSessionRequest) -> AppResult<CreatedSession> {
    // The provider's API is form-encoded with indexed bracket keys.
    let mut form: Vec<(String, String)> = vec![
      ("mode".to_string(), "payment".to_string()),
      ("payment_method_types[0]".to_string(), "card".to_string()),
      ("success_url".to_string(), request.success_url.clone()),
      ("cancel_url".to_string(), request.cancel_url.clone()),
    ];
    for (i, item) in request.line_items.iter().enumerate() {
      form.push((format!("line_items[{}][price_data][currency]", i), item.currency.clone()));
      form.push((
        format!("line_items[{}][price_data][unit_amount]", i),
        item.unit_amount.to_string(),
      ));
      form.push((
        format!("line_items[{}][price_data][product_data][name]", i),
        item.name.clone(),
      ));
      form.push((format!("line_items[{}][quantity]", i), item.quantity.to_string()));
    }

    let response = self
      .client
      .post(self.sessions_url())
      .bearer_auth(&self.secret_key)
      .form(&form)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(provider_error(response).await);
    }

    let session: WireSession = response.json().await?;
    let hosted_url = session
      .url
      .ok_or_else(|| AppError::Provider("Provider returned a session without a hosted URL".to_string()))?;
    info!(session_id = %session.id, "Checkout session created at provider");
    Ok(CreatedSession {
      session_id: session.id,
      hosted_url,
    })
  }

  #[instrument(name = "payments::get_session", skip(self))]
  async fn get_session(&self, session_id: &str) -> AppResult<ProviderSession> {
    let response = self
      .client
      .get(format!("{}/{}", self.sessions_url(), session_id))
      .bearer_auth(&self.secret_key)
      .query(&[
        ("expand[]", "line_items"),
        ("expand[]", "line_items.data.price.product"),
      ])
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(provider_error(response).await);
    }

    let session: WireSession = response.json().await?;
    Ok(session.into())
  }
}
