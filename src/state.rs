use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::catalog::CatalogRepository;
use crate::services::checkout::CheckoutInitiator;
use crate::services::order_repo::OrderRepository;
use crate::services::payments::PaymentProvider;
use crate::services::webhook::WebhookReconciler;

/// Shared application state handed to every handler. All collaborators sit
/// behind trait objects so the HTTP surface can be exercised against the
/// mock provider and in-memory repositories.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub catalog: Arc<dyn CatalogRepository>,
  pub orders: Arc<dyn OrderRepository>,
  pub payments: Arc<dyn PaymentProvider>,
  pub checkout: Arc<CheckoutInitiator>,
  pub reconciler: Arc<WebhookReconciler>,
}

impl AppState {
  pub fn new(
    config: Arc<AppConfig>,
    catalog: Arc<dyn CatalogRepository>,
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentProvider>,
  ) -> Self {
    let checkout = Arc::new(CheckoutInitiator::new(
      payments.clone(),
      orders.clone(),
      &config.currency,
      &config.app_base_url,
    ));
    let reconciler = Arc::new(WebhookReconciler::new(orders.clone(), &config.webhook_signing_secret));
    Self {
      config,
      catalog,
      orders,
      payments,
      checkout,
      reconciler,
    }
  }
}
