use actix_web::{web as actix_data, App, HttpServer};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use craftshop::config::AppConfig;
use craftshop::services::catalog::PgCatalogRepository;
use craftshop::services::order_repo::PgOrderRepository;
use craftshop::services::payments::HttpPaymentProvider;
use craftshop::state::AppState;
use craftshop::web::configure_app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting craftshop storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  let db_pool = match PgPool::connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  let payments = match HttpPaymentProvider::new(
    &app_config.payment_api_base,
    &app_config.payment_secret_key,
    app_config.provider_timeout,
  ) {
    Ok(provider) => Arc::new(provider),
    Err(e) => {
      tracing::error!(error = %e, "Failed to build the payment provider client.");
      panic!("Payment provider error: {}", e);
    }
  };

  let app_state = AppState::new(
    app_config.clone(),
    Arc::new(PgCatalogRepository::new(db_pool.clone())),
    Arc::new(PgOrderRepository::new(db_pool)),
    payments,
  );

  if app_config.seed_db {
    if let Err(e) = craftshop::services::catalog::seed_sample_products(app_state.catalog.as_ref()).await {
      tracing::error!(error = %e, "Failed to seed catalog.");
    }
  }

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
