//! HTTP-level tests for the storefront API: checkout initiation, webhook
//! reconciliation and the confirmation-page order view, wired against the
//! mock payment provider and in-memory repositories.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use chrono::Utc;
use serde_json::{json, Value};

use craftshop::config::AppConfig;
use craftshop::models::OrderStatus;
use craftshop::services::catalog::InMemoryCatalogRepository;
use craftshop::services::order_repo::{InMemoryOrderRepository, OrderRepository};
use craftshop::services::payment_mock::MockPaymentProvider;
use craftshop::services::webhook::{sign_payload, COMPLETED_EVENT_TYPE, SIGNATURE_HEADER};
use craftshop::state::AppState;
use craftshop::web::configure_app_routes;

const WEBHOOK_SECRET: &str = "whsec_test_secret";
const ADMIN_KEY: &str = "test-admin-key";

fn test_config() -> Arc<AppConfig> {
  Arc::new(AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: "postgres://unused".to_string(),
    app_base_url: "https://shop.test".to_string(),
    payment_api_base: "https://provider.test".to_string(),
    payment_secret_key: "sk_test_unused".to_string(),
    webhook_signing_secret: WEBHOOK_SECRET.to_string(),
    provider_timeout: Duration::from_secs(5),
    currency: "kes".to_string(),
    admin_api_key: ADMIN_KEY.to_string(),
    seed_db: false,
  })
}

struct TestHarness {
  provider: MockPaymentProvider,
  orders: InMemoryOrderRepository,
}

impl TestHarness {
  fn new() -> Self {
    Self {
      provider: MockPaymentProvider::new(),
      orders: InMemoryOrderRepository::new(),
    }
  }

  async fn app(
    &self,
  ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let state = AppState::new(
      test_config(),
      Arc::new(InMemoryCatalogRepository::new()),
      Arc::new(self.orders.clone()),
      Arc::new(self.provider.clone()),
    );
    test::init_service(
      App::new()
        .app_data(web::Data::new(state))
        .configure(configure_app_routes),
    )
    .await
  }
}

fn sample_cart() -> Value {
  json!({
    "items": [
      { "product": { "id": "p1", "name": "Woven Basket", "price": 1000 }, "quantity": 2 },
      { "product": { "id": "p2", "name": "Clay Mug", "price": 500 }, "quantity": 1 }
    ]
  })
}

fn completed_event(session_id: &str, amount_total: i64) -> String {
  json!({
    "type": COMPLETED_EVENT_TYPE,
    "data": {
      "object": {
        "id": session_id,
        "customer_details": { "name": "Jane Shopper", "email": "jane@example.com" },
        "amount_total": amount_total,
        "status": "complete"
      }
    }
  })
  .to_string()
}

#[actix_web::test]
async fn health_endpoint_answers_ok() {
  let harness = TestHarness::new();
  let app = harness.app().await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert!(resp.status().is_success());
}

#[actix_web::test]
async fn checkout_returns_hosted_url_and_records_provisional_order() {
  let harness = TestHarness::new();
  let app = harness.app().await;

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/checkout")
      .set_json(sample_cart())
      .to_request(),
  )
  .await;
  assert!(resp.status().is_success());

  let body: Value = test::read_body_json(resp).await;
  let session_id = body["sessionId"].as_str().unwrap().to_string();
  assert!(body["url"].as_str().unwrap().contains(&session_id));

  let record = harness.orders.get(&session_id).await.unwrap().unwrap();
  assert_eq!(record.status, OrderStatus::Processing);
  assert_eq!(record.items.len(), 2);

  // Line amounts reached the provider in minor units.
  let request = &harness.provider.requests()[0];
  assert_eq!(request.line_items[0].unit_amount, 100_000);
  assert_eq!(request.line_items[1].unit_amount, 50_000);
}

#[actix_web::test]
async fn checkout_rejects_an_empty_cart() {
  let harness = TestHarness::new();
  let app = harness.app().await;

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/checkout")
      .set_json(json!({ "items": [] }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), 400);
  assert!(harness.orders.is_empty());
}

#[actix_web::test]
async fn checkout_provider_failure_answers_5xx_and_writes_nothing() {
  let harness = TestHarness::new();
  harness.provider.fail_session_creation(true);
  let app = harness.app().await;

  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/checkout")
      .set_json(sample_cart())
      .to_request(),
  )
  .await;
  assert!(resp.status().is_server_error());
  assert!(harness.orders.is_empty());
}

#[actix_web::test]
async fn webhook_completes_the_order_end_to_end() {
  let harness = TestHarness::new();
  let app = harness.app().await;

  // 1. Checkout
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/checkout")
      .set_json(sample_cart())
      .to_request(),
  )
  .await;
  let body: Value = test::read_body_json(resp).await;
  let session_id = body["sessionId"].as_str().unwrap().to_string();

  // 2. Provider delivers the completion event
  let payload = completed_event(&session_id, 250_000);
  let header = sign_payload(WEBHOOK_SECRET, Utc::now().timestamp(), payload.as_bytes());
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/webhooks/payments")
      .insert_header((SIGNATURE_HEADER, header.clone()))
      .set_payload(payload.clone())
      .to_request(),
  )
  .await;
  assert!(resp.status().is_success());

  let record = harness.orders.get(&session_id).await.unwrap().unwrap();
  assert_eq!(record.status, OrderStatus::Completed);
  assert_eq!(record.total(), 2500.0);
  assert_eq!(record.customer_name.as_deref(), Some("Jane Shopper"));
  // The provisional line snapshot survived the completion overwrite.
  assert_eq!(record.items.len(), 2);

  // 3. Redelivery converges to the same record
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/webhooks/payments")
      .insert_header((SIGNATURE_HEADER, header))
      .set_payload(payload)
      .to_request(),
  )
  .await;
  assert!(resp.status().is_success());
  let after_redelivery = harness.orders.get(&session_id).await.unwrap().unwrap();
  assert_eq!(after_redelivery.status, OrderStatus::Completed);
  assert_eq!(after_redelivery.total(), 2500.0);

  // 4. Confirmation page view from the provider
  harness.provider.complete_session(&session_id, "Jane Shopper", "jane@example.com");
  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri(&format!("/api/v1/orders/{}", session_id))
      .to_request(),
  )
  .await;
  assert!(resp.status().is_success());
  let view: Value = test::read_body_json(resp).await;
  assert_eq!(view["orderNumber"], session_id.as_str());
  assert_eq!(view["customerName"], "Jane Shopper");
  assert_eq!(view["total"], 2500.0);
  assert_eq!(view["items"].as_array().unwrap().len(), 2);
  assert!(view["estimatedDelivery"].as_str().is_some());
}

#[actix_web::test]
async fn webhook_with_invalid_signature_answers_400_without_mutation() {
  let harness = TestHarness::new();
  let app = harness.app().await;

  let payload = completed_event("cs_forged", 250_000);
  let header = sign_payload("not_the_real_secret", Utc::now().timestamp(), payload.as_bytes());
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/webhooks/payments")
      .insert_header((SIGNATURE_HEADER, header))
      .set_payload(payload)
      .to_request(),
  )
  .await;

  assert_eq!(resp.status(), 400);
  assert!(harness.orders.is_empty());
}

#[actix_web::test]
async fn webhook_store_failure_answers_5xx_for_provider_retry() {
  let harness = TestHarness::new();
  harness.orders.fail_writes(true);
  let app = harness.app().await;

  let payload = completed_event("cs_1", 250_000);
  let header = sign_payload(WEBHOOK_SECRET, Utc::now().timestamp(), payload.as_bytes());
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/webhooks/payments")
      .insert_header((SIGNATURE_HEADER, header))
      .set_payload(payload)
      .to_request(),
  )
  .await;

  assert!(resp.status().is_server_error());
}

#[actix_web::test]
async fn webhook_ignores_other_event_types_with_2xx() {
  let harness = TestHarness::new();
  let app = harness.app().await;

  let payload = json!({ "type": "checkout.expired", "data": { "object": { "id": "cs_1" } } }).to_string();
  let header = sign_payload(WEBHOOK_SECRET, Utc::now().timestamp(), payload.as_bytes());
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/webhooks/payments")
      .insert_header((SIGNATURE_HEADER, header))
      .set_payload(payload)
      .to_request(),
  )
  .await;

  assert!(resp.status().is_success());
  assert!(harness.orders.is_empty());
}

#[actix_web::test]
async fn unknown_order_lookup_answers_404() {
  let harness = TestHarness::new();
  let app = harness.app().await;

  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri("/api/v1/orders/cs_does_not_exist")
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn product_mutations_require_the_admin_key() {
  let harness = TestHarness::new();
  let app = harness.app().await;

  let payload = json!({ "name": "Woven Basket", "price": 1000, "category": "baskets" });

  // No key: rejected
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/products")
      .set_json(&payload)
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), 401);

  // With key: created, then publicly readable, then deletable
  let resp = test::call_service(
    &app,
    test::TestRequest::post()
      .uri("/api/v1/products")
      .insert_header(("X-Admin-Key", ADMIN_KEY))
      .set_json(&payload)
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), 201);
  let created: Value = test::read_body_json(resp).await;
  let id = created["id"].as_str().unwrap().to_string();

  let resp = test::call_service(
    &app,
    test::TestRequest::get().uri(&format!("/api/v1/products/{}", id)).to_request(),
  )
  .await;
  assert!(resp.status().is_success());

  let resp = test::call_service(
    &app,
    test::TestRequest::delete()
      .uri(&format!("/api/v1/products/{}", id))
      .insert_header(("X-Admin-Key", ADMIN_KEY))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), 204);

  let resp = test::call_service(
    &app,
    test::TestRequest::get().uri(&format!("/api/v1/products/{}", id)).to_request(),
  )
  .await;
  assert_eq!(resp.status(), 404);
}
