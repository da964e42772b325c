//! Order lookup: resolves the session id from the success-redirect URL into
//! a display-ready view for the confirmation page.
//!
//! The provider is queried directly rather than the local order record: the
//! record may not yet reflect webhook processing, while the provider's view
//! of a session is real time. Optional customer fields get defaults so the
//! view never comes back partially filled.

use chrono::{DateTime, Duration, Utc};
use tracing::instrument;

use crate::errors::Result as AppResult;
use crate::models::{OrderView, OrderViewItem};
use crate::services::checkout::MINOR_UNITS_PER_MAJOR;
use crate::services::payments::PaymentProvider;

/// Fulfilment policy: handmade goods ship within two weeks.
pub const DELIVERY_ESTIMATE_DAYS: i64 = 14;

const DEFAULT_CUSTOMER_NAME: &str = "Customer";
const DEFAULT_ITEM_NAME: &str = "Product";

/// ISO date the order is expected to arrive, counted from `now`.
pub fn estimated_delivery(now: DateTime<Utc>) -> String {
  (now + Duration::days(DELIVERY_ESTIMATE_DAYS)).format("%Y-%m-%d").to_string()
}

#[instrument(name = "orders::lookup", skip(provider))]
pub async fn lookup_order(provider: &dyn PaymentProvider, session_id: &str) -> AppResult<OrderView> {
  let session = provider.get_session(session_id).await?;

  let items = session
    .line_items
    .into_iter()
    .map(|line| OrderViewItem {
      id: line.id,
      name: line.name.unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string()),
      quantity: line.quantity,
      price: line.amount_total as f64 / MINOR_UNITS_PER_MAJOR as f64,
      image: line.image,
    })
    .collect();

  Ok(OrderView {
    order_number: session.session_id,
    customer_name: session
      .customer
      .name
      .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
    email: session.customer.email.unwrap_or_default(),
    items,
    total: session.amount_total as f64 / MINOR_UNITS_PER_MAJOR as f64,
    estimated_delivery: estimated_delivery(Utc::now()),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::errors::AppError;
  use crate::models::{CartLine, ProductSnapshot};
  use crate::services::payment_mock::MockPaymentProvider;
  use crate::services::payments::{CreateSessionRequest, SessionLineItem};
  use chrono::TimeZone;

  async fn seeded_session(provider: &MockPaymentProvider) -> String {
    let created = provider
      .create_session(CreateSessionRequest {
        line_items: vec![
          SessionLineItem {
            name: "Woven Basket".to_string(),
            currency: "kes".to_string(),
            unit_amount: 100_000,
            quantity: 2,
          },
          SessionLineItem {
            name: "Clay Mug".to_string(),
            currency: "kes".to_string(),
            unit_amount: 50_000,
            quantity: 1,
          },
        ],
        success_url: "https://shop.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}".to_string(),
        cancel_url: "https://shop.example.com/checkout/cancel".to_string(),
      })
      .await
      .unwrap();
    created.session_id
  }

  #[test]
  fn delivery_estimate_is_now_plus_fixed_offset() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    assert_eq!(estimated_delivery(now), "2026-03-15");
  }

  #[tokio::test]
  async fn lookup_denormalizes_the_provider_session() {
    let provider = MockPaymentProvider::new();
    let session_id = seeded_session(&provider).await;
    provider.complete_session(&session_id, "Jane Shopper", "jane@example.com");

    let view = lookup_order(&provider, &session_id).await.unwrap();

    assert_eq!(view.order_number, session_id);
    assert_eq!(view.customer_name, "Jane Shopper");
    assert_eq!(view.email, "jane@example.com");
    assert_eq!(view.total, 2500.0);
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.items[0].name, "Woven Basket");
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.items[0].price, 2000.0);
    assert_eq!(view.items[1].price, 500.0);
  }

  #[tokio::test]
  async fn absent_customer_fields_get_defaults() {
    let provider = MockPaymentProvider::new();
    // Session never completed: the mock has no customer details for it.
    let session_id = seeded_session(&provider).await;

    let view = lookup_order(&provider, &session_id).await.unwrap();

    assert_eq!(view.customer_name, "Customer");
    assert_eq!(view.email, "");
  }

  #[tokio::test]
  async fn unknown_session_is_not_found() {
    let provider = MockPaymentProvider::new();
    let result = lookup_order(&provider, "cs_does_not_exist").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
  }

  #[tokio::test]
  async fn cart_snapshot_conversion_keeps_first_image() {
    // Regression guard for the snapshot-at-add-time contract.
    let product = crate::models::Product {
      id: "p1".to_string(),
      name: "Woven Basket".to_string(),
      description: None,
      price: 1000,
      original_price: None,
      category: "baskets".to_string(),
      images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
      in_stock: true,
      stock_count: 3,
      is_new: false,
      is_sale: false,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    };
    let line = CartLine {
      product: ProductSnapshot::from(&product),
      quantity: 1,
    };
    assert_eq!(line.product.image.as_deref(), Some("a.jpg"));
  }
}
