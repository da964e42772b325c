use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::CartLine;

/// Provider-driven lifecycle of an order record. `Processing` is written
/// optimistically when the checkout session is created; `Completed` and
/// `Failed` only ever come from the webhook reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Processing,
  Completed,
  Failed,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Processing => "processing",
      OrderStatus::Completed => "completed",
      OrderStatus::Failed => "failed",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "processing" => Some(OrderStatus::Processing),
      "completed" => Some(OrderStatus::Completed),
      "failed" => Some(OrderStatus::Failed),
      _ => None,
    }
  }
}

/// Immutable line-item snapshot captured when checkout was initiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub product_id: String,
  pub name: String,
  /// Unit price in major currency units, as captured in the cart.
  pub price: i64,
  pub quantity: i64,
  #[serde(default)]
  pub image: Option<String>,
}

impl From<&CartLine> for OrderLine {
  fn from(line: &CartLine) -> Self {
    Self {
      product_id: line.product.id.clone(),
      name: line.product.name.clone(),
      price: line.product.price,
      quantity: line.quantity,
      image: line.product.image.clone(),
    }
  }
}

/// The durable order document, keyed by the provider's checkout-session id.
/// Exactly one record exists per session id; both write paths (provisional
/// write at checkout, completion write from the webhook) are full upserts on
/// that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
  pub session_id: String,
  pub items: Vec<OrderLine>,
  pub status: OrderStatus,
  pub customer_name: Option<String>,
  pub email: Option<String>,
  /// Amount the provider charged, in minor units. Absent until the
  /// completion event arrives.
  pub amount_total_cents: Option<i64>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
  /// Total in major currency units, two-decimal, for display.
  pub fn total(&self) -> f64 {
    self.amount_total_cents.unwrap_or(0) as f64 / 100.0
  }
}

/// Display-ready view for the post-checkout confirmation page. Derived on
/// read from the provider's session data; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
  pub order_number: String,
  pub customer_name: String,
  pub email: String,
  pub items: Vec<OrderViewItem>,
  /// Total in major currency units.
  pub total: f64,
  /// ISO date, computed as today plus a fixed fulfilment offset.
  pub estimated_delivery: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderViewItem {
  pub id: String,
  pub name: String,
  pub quantity: i64,
  /// Line total in major currency units, as billed by the provider.
  pub price: f64,
  #[serde(default)]
  pub image: Option<String>,
}
