use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  /// Public base URL of the storefront, used to build the success/cancel
  /// redirect targets handed to the payment provider.
  pub app_base_url: String,

  // Payment provider (Stripe-compatible checkout-session API)
  pub payment_api_base: String,
  pub payment_secret_key: String,
  pub webhook_signing_secret: String,
  /// Hard deadline for any provider round trip; a hung provider call must
  /// not block the calling request indefinitely.
  pub provider_timeout: Duration,

  /// ISO 4217 code used for every checkout line item.
  pub currency: String,

  /// Shared key gating the admin catalog mutations.
  pub admin_api_key: String,

  pub seed_db: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let payment_api_base = get_env("PAYMENT_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".to_string());
    let payment_secret_key = get_env("PAYMENT_SECRET_KEY")?;
    let webhook_signing_secret = get_env("PAYMENT_WEBHOOK_SECRET")?;
    let provider_timeout_secs = get_env("PROVIDER_TIMEOUT_SECS")
      .unwrap_or_else(|_| "15".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid PROVIDER_TIMEOUT_SECS: {}", e)))?;

    let currency = get_env("CHECKOUT_CURRENCY").unwrap_or_else(|_| "kes".to_string());
    let admin_api_key = get_env("ADMIN_API_KEY")?;

    let seed_db = get_env("SEED_DB")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      payment_api_base,
      payment_secret_key,
      webhook_signing_secret,
      provider_timeout: Duration::from_secs(provider_timeout_secs),
      currency,
      admin_api_key,
      seed_db,
    })
  }
}
