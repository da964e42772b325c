use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A catalog record. `price` is in major currency units (whole shillings);
/// conversion to the provider's minor-unit convention happens only at
/// checkout time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub price: i64,
  pub original_price: Option<i64>,
  pub category: String,
  pub images: Vec<String>,
  pub in_stock: bool,
  pub stock_count: i64,
  pub is_new: bool,
  pub is_sale: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Admin payload for creating or replacing a catalog record. The document
/// id and timestamps are assigned server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price: i64,
  #[serde(default)]
  pub original_price: Option<i64>,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub images: Vec<String>,
  #[serde(default = "default_in_stock")]
  pub in_stock: bool,
  #[serde(default)]
  pub stock_count: i64,
  #[serde(default)]
  pub is_new: bool,
  #[serde(default)]
  pub is_sale: bool,
}

fn default_in_stock() -> bool {
  true
}
