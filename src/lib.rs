//! Storefront backend for a handmade-goods shop.
//!
//! The crate is a library plus a thin server binary. The core pieces — the
//! cart manager, the checkout session initiator, the webhook reconciler and
//! the order lookup — live here behind explicit seams (storage backends,
//! repositories, the payment-provider trait) so they are testable without a
//! running server, a database or provider credentials.

pub mod cart;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod state;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
