use actix_web::web;

// Liveness probe; deliberately does not touch the database or the provider.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called from `main.rs` (and the integration tests) to configure services
// for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      // Catalog: public reads, admin-gated writes
      .service(
        web::scope("/products")
          .route(
            "",
            web::get().to(crate::web::handlers::product_handlers::list_products_handler),
          )
          .route(
            "",
            web::post().to(crate::web::handlers::product_handlers::create_product_handler),
          )
          .route(
            "/{product_id}",
            web::get().to(crate::web::handlers::product_handlers::get_product_handler),
          )
          .route(
            "/{product_id}",
            web::put().to(crate::web::handlers::product_handlers::update_product_handler),
          )
          .route(
            "/{product_id}",
            web::delete().to(crate::web::handlers::product_handlers::delete_product_handler),
          ),
      )
      // Checkout: cart contents in, hosted payment URL out
      .service(web::scope("/checkout").route(
        "",
        web::post().to(crate::web::handlers::checkout_handlers::start_checkout_handler),
      ))
      // Payment provider callback (raw body; signature-verified)
      .service(web::scope("/webhooks").route(
        "/payments",
        web::post().to(crate::web::handlers::webhook_handlers::payment_webhook_handler),
      ))
      // Confirmation-page order view
      .service(web::scope("/orders").route(
        "/{session_id}",
        web::get().to(crate::web::handlers::order_handlers::get_order_handler),
      )),
  );
}
