//! Checkout session initiation: turns the current cart into a provider
//! checkout session and registers a provisional order record.
//!
//! Ordering is deliberate: the provider session is created first, the order
//! record second, never the reverse. A failed session creation must not
//! leave an orphaned record referencing a session that was never issued. If
//! the record write fails after a successful session creation, the webhook
//! reconciler heals the gap on first delivery because its write is an
//! upsert, not an update.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{CartLine, OrderLine, OrderRecord, OrderStatus};
use crate::services::order_repo::OrderRepository;
use crate::services::payments::{CreateSessionRequest, PaymentProvider, SessionLineItem};

/// Conversion between catalog prices (major units) and the provider's
/// minor-unit convention.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Placeholder the provider substitutes with the real session id when it
/// redirects back to the storefront.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Debug, Clone)]
pub struct CheckoutRedirect {
  pub session_id: String,
  /// The provider's hosted checkout page the shopper is sent to.
  pub checkout_url: String,
}

pub struct CheckoutInitiator {
  provider: Arc<dyn PaymentProvider>,
  orders: Arc<dyn OrderRepository>,
  currency: String,
  app_base_url: String,
}

impl CheckoutInitiator {
  pub fn new(
    provider: Arc<dyn PaymentProvider>,
    orders: Arc<dyn OrderRepository>,
    currency: &str,
    app_base_url: &str,
  ) -> Self {
    Self {
      provider,
      orders,
      currency: currency.to_string(),
      app_base_url: app_base_url.trim_end_matches('/').to_string(),
    }
  }

  #[instrument(name = "checkout::initiate", skip(self, lines), fields(line_count = lines.len()))]
  pub async fn initiate(&self, lines: &[CartLine]) -> AppResult<CheckoutRedirect> {
    // Local validation happens before any network call; a malformed cart
    // never reaches the provider.
    if lines.is_empty() {
      return Err(AppError::Validation("Cannot check out an empty cart".to_string()));
    }
    for line in lines {
      if line.quantity < 1 {
        return Err(AppError::Validation(format!(
          "Invalid quantity {} for product '{}'",
          line.quantity, line.product.id
        )));
      }
      if line.product.price <= 0 {
        return Err(AppError::Validation(format!(
          "Invalid unit price {} for product '{}'",
          line.product.price, line.product.id
        )));
      }
    }

    let request = CreateSessionRequest {
      line_items: lines
        .iter()
        .map(|line| SessionLineItem {
          name: line.product.name.clone(),
          currency: self.currency.clone(),
          unit_amount: line.product.price * MINOR_UNITS_PER_MAJOR,
          quantity: line.quantity,
        })
        .collect(),
      success_url: format!(
        "{}/checkout/success?session_id={}",
        self.app_base_url, SESSION_ID_PLACEHOLDER
      ),
      cancel_url: format!("{}/checkout/cancel", self.app_base_url),
    };

    let session = self.provider.create_session(request).await?;

    let now = Utc::now();
    let provisional = OrderRecord {
      session_id: session.session_id.clone(),
      items: lines.iter().map(OrderLine::from).collect(),
      status: OrderStatus::Processing,
      customer_name: None,
      email: None,
      amount_total_cents: None,
      created_at: now,
      updated_at: now,
    };

    if let Err(e) = self.orders.put(&provisional).await {
      // The session exists at the provider but has no local record. The
      // webhook upsert recreates it on first delivery; the checkout attempt
      // itself still fails so the caller can retry.
      error!(session_id = %session.session_id, error = %e, "Provisional order write failed after session creation");
      return Err(e);
    }

    info!(session_id = %session.session_id, "Provisional order recorded, redirecting to hosted checkout");
    Ok(CheckoutRedirect {
      session_id: session.session_id,
      checkout_url: session.hosted_url,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::ProductSnapshot;
  use crate::services::order_repo::InMemoryOrderRepository;
  use crate::services::payment_mock::MockPaymentProvider;

  fn line(id: &str, price: i64, quantity: i64) -> CartLine {
    CartLine {
      product: ProductSnapshot {
        id: id.to_string(),
        name: format!("Product {}", id),
        price,
        image: None,
        in_stock: true,
      },
      quantity,
    }
  }

  fn initiator(provider: &MockPaymentProvider, orders: &InMemoryOrderRepository) -> CheckoutInitiator {
    CheckoutInitiator::new(
      Arc::new(provider.clone()),
      Arc::new(orders.clone()),
      "kes",
      "https://shop.example.com/",
    )
  }

  #[tokio::test]
  async fn empty_cart_is_rejected_before_the_provider_is_called() {
    let provider = MockPaymentProvider::new();
    let orders = InMemoryOrderRepository::new();

    let result = initiator(&provider, &orders).initiate(&[]).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(provider.requests().is_empty());
    assert!(orders.is_empty());
  }

  #[tokio::test]
  async fn non_positive_price_is_rejected_before_the_provider_is_called() {
    let provider = MockPaymentProvider::new();
    let orders = InMemoryOrderRepository::new();

    let result = initiator(&provider, &orders).initiate(&[line("p1", 0, 1)]).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(provider.requests().is_empty());
  }

  #[tokio::test]
  async fn line_items_are_converted_to_minor_units() {
    let provider = MockPaymentProvider::new();
    let orders = InMemoryOrderRepository::new();

    initiator(&provider, &orders)
      .initiate(&[line("p1", 1000, 2), line("p2", 500, 1)])
      .await
      .unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let items = &requests[0].line_items;
    assert_eq!(items[0].unit_amount, 100_000);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[1].unit_amount, 50_000);
    assert_eq!(items[1].quantity, 1);
  }

  #[tokio::test]
  async fn redirect_urls_embed_the_session_placeholder() {
    let provider = MockPaymentProvider::new();
    let orders = InMemoryOrderRepository::new();

    initiator(&provider, &orders).initiate(&[line("p1", 100, 1)]).await.unwrap();

    let request = &provider.requests()[0];
    assert_eq!(
      request.success_url,
      "https://shop.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(request.cancel_url, "https://shop.example.com/checkout/cancel");
  }

  #[tokio::test]
  async fn successful_initiation_records_a_provisional_order() {
    let provider = MockPaymentProvider::new();
    let orders = InMemoryOrderRepository::new();

    let redirect = initiator(&provider, &orders)
      .initiate(&[line("p1", 1000, 2)])
      .await
      .unwrap();

    let record = orders.get(&redirect.session_id).await.unwrap().unwrap();
    assert_eq!(record.status, OrderStatus::Processing);
    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].product_id, "p1");
    assert_eq!(record.items[0].price, 1000);
    assert_eq!(record.items[0].quantity, 2);
    assert_eq!(record.amount_total_cents, None);
  }

  #[tokio::test]
  async fn provider_failure_leaves_no_provisional_order() {
    let provider = MockPaymentProvider::new();
    provider.fail_session_creation(true);
    let orders = InMemoryOrderRepository::new();

    let result = initiator(&provider, &orders).initiate(&[line("p1", 1000, 1)]).await;

    assert!(matches!(result, Err(AppError::Provider(_))));
    assert!(orders.is_empty());
  }

  #[tokio::test]
  async fn order_write_failure_surfaces_after_session_creation() {
    let provider = MockPaymentProvider::new();
    let orders = InMemoryOrderRepository::new();
    orders.fail_writes(true);

    let result = initiator(&provider, &orders).initiate(&[line("p1", 1000, 1)]).await;

    assert!(result.is_err());
    // The session was created at the provider; only the local record is missing.
    assert_eq!(provider.requests().len(), 1);
    assert!(orders.is_empty());
  }
}
