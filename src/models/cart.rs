use serde::{Deserialize, Serialize};

use crate::models::Product;

/// The slice of a catalog record a cart line captures at add time. It is a
/// snapshot, not a live link: a later catalog price change does not alter a
/// line already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
  pub id: String,
  pub name: String,
  pub price: i64,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default = "snapshot_in_stock_default")]
  pub in_stock: bool,
}

fn snapshot_in_stock_default() -> bool {
  true
}

impl From<&Product> for ProductSnapshot {
  fn from(product: &Product) -> Self {
    Self {
      id: product.id.clone(),
      name: product.name.clone(),
      price: product.price,
      image: product.images.first().cloned(),
      in_stock: product.in_stock,
    }
  }
}

/// One product-identity + quantity pair within a shopper's cart.
/// Invariant: `quantity >= 1`; a cart holds at most one line per product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product: ProductSnapshot,
  pub quantity: i64,
}

impl CartLine {
  /// Line subtotal in major currency units.
  pub fn subtotal(&self) -> i64 {
    self.product.price * self.quantity
  }
}
