//! Business services: the payment-provider client, the checkout and
//! reconciliation flows, and the repositories behind them.

pub mod catalog;
pub mod checkout;
pub mod order_repo;
pub mod orders;
pub mod payment_mock;
pub mod payments;
pub mod webhook;
