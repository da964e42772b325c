//! The cart manager: the authoritative view of what the shopper intends to
//! buy, independent of catalog or payment state.
//!
//! Mutations apply in memory first and then re-persist the full serialized
//! cart, so persistence timing is an explicit step of every operation rather
//! than a side effect of some observer. Hydration failure is silent by
//! design: an empty cart is always a valid fallback state.

pub mod storage;

use tracing::warn;

use crate::models::{CartLine, ProductSnapshot};
use storage::CartStorage;

pub struct CartStore {
  lines: Vec<CartLine>,
  storage: Box<dyn CartStorage>,
}

impl CartStore {
  /// Hydrates from the storage slot. A missing slot or malformed contents
  /// degrades to an empty cart; the cart manager has no error mode.
  pub fn load(storage: Box<dyn CartStorage>) -> Self {
    let lines = match storage.load() {
      Ok(Some(serialized)) => match serde_json::from_str::<Vec<CartLine>>(&serialized) {
        Ok(lines) => lines,
        Err(e) => {
          warn!(error = %e, "Stored cart is malformed; starting with an empty cart");
          Vec::new()
        }
      },
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!(error = %e, "Failed to read cart storage; starting with an empty cart");
        Vec::new()
      }
    };
    Self { lines, storage }
  }

  /// Adds `quantity` of `product`. If a line for the same product id already
  /// exists its quantity is incremented; the cart never holds two lines for
  /// one product identity. Stock checks are the caller's concern.
  pub fn add(&mut self, product: ProductSnapshot, quantity: i64) {
    let quantity = quantity.max(1);
    if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
      line.quantity += quantity;
    } else {
      self.lines.push(CartLine { product, quantity });
    }
    self.persist();
  }

  /// Removes the line for `product_id`. A no-op if absent.
  pub fn remove(&mut self, product_id: &str) {
    self.lines.retain(|l| l.product.id != product_id);
    self.persist();
  }

  /// Sets the quantity for `product_id`. A quantity of zero or less is
  /// removal; otherwise the line is set to at least 1, so decrementing from
  /// 1 never produces a zero-quantity line without explicit removal.
  pub fn set_quantity(&mut self, product_id: &str, quantity: i64) {
    if quantity <= 0 {
      self.remove(product_id);
      return;
    }
    if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
      line.quantity = quantity.max(1);
    }
    self.persist();
  }

  pub fn clear(&mut self) {
    self.lines.clear();
    self.persist();
  }

  /// Cart total in major currency units, computed fresh on every call.
  pub fn total(&self) -> i64 {
    self.lines.iter().map(CartLine::subtotal).sum()
  }

  /// Lines in insertion order (display order; not semantically significant).
  pub fn lines(&self) -> &[CartLine] {
    &self.lines
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  fn persist(&self) {
    let serialized = match serde_json::to_string(&self.lines) {
      Ok(s) => s,
      Err(e) => {
        warn!(error = %e, "Failed to serialize cart for persistence");
        return;
      }
    };
    if let Err(e) = self.storage.save(&serialized) {
      warn!(error = %e, "Failed to persist cart");
    }
  }
}
