//! In-process stand-in for the payment provider, used by the test suites
//! and for running the server without provider credentials.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, Result as AppResult};
use crate::services::payments::{
  CreateSessionRequest, CreatedSession, PaymentProvider, ProviderSession, SessionCustomer, SessionLine,
};

#[derive(Debug, Clone)]
struct MockSession {
  request: CreateSessionRequest,
  status: String,
  customer: SessionCustomer,
}

/// Mock provider. Sessions are held in memory; tests drive the asynchronous
/// half of the lifecycle by calling [`MockPaymentProvider::complete_session`].
#[derive(Clone, Default)]
pub struct MockPaymentProvider {
  sessions: Arc<RwLock<HashMap<String, MockSession>>>,
  requests: Arc<RwLock<Vec<CreateSessionRequest>>>,
  fail_session_creation: Arc<RwLock<bool>>,
}

impl MockPaymentProvider {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes every subsequent `create_session` call fail, simulating a
  /// provider outage or rejection.
  pub fn fail_session_creation(&self, fail: bool) {
    *self.fail_session_creation.write() = fail;
  }

  /// Every session-creation request received, in order.
  pub fn requests(&self) -> Vec<CreateSessionRequest> {
    self.requests.read().clone()
  }

  /// Marks a session as paid, as the hosted checkout page would after the
  /// shopper completes payment.
  pub fn complete_session(&self, session_id: &str, customer_name: &str, email: &str) {
    if let Some(session) = self.sessions.write().get_mut(session_id) {
      session.status = "complete".to_string();
      session.customer = SessionCustomer {
        name: Some(customer_name.to_string()),
        email: Some(email.to_string()),
      };
    }
  }

  fn amount_total(request: &CreateSessionRequest) -> i64 {
    request.line_items.iter().map(|l| l.unit_amount * l.quantity).sum()
  }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
  async fn create_session(&self, request: CreateSessionRequest) -> AppResult<CreatedSession> {
    if *self.fail_session_creation.read() {
      return Err(AppError::Provider("Mock provider rejected session creation".to_string()));
    }
    if request.line_items.is_empty() {
      return Err(AppError::Provider("Session must have at least one line item".to_string()));
    }

    let session_id = format!("cs_mock_{}", Uuid::new_v4().simple());
    let hosted_url = format!("https://checkout.mock.local/pay/{}", session_id);
    info!(session_id = %session_id, "Mock provider created checkout session");

    self.requests.write().push(request.clone());
    self.sessions.write().insert(
      session_id.clone(),
      MockSession {
        request,
        status: "open".to_string(),
        customer: SessionCustomer::default(),
      },
    );

    Ok(CreatedSession { session_id, hosted_url })
  }

  async fn get_session(&self, session_id: &str) -> AppResult<ProviderSession> {
    let sessions = self.sessions.read();
    let session = sessions
      .get(session_id)
      .ok_or_else(|| AppError::NotFound(format!("No such checkout session: {}", session_id)))?;

    let line_items = session
      .request
      .line_items
      .iter()
      .enumerate()
      .map(|(i, item)| SessionLine {
        id: format!("li_{}_{}", session_id, i),
        name: Some(item.name.clone()),
        quantity: item.quantity,
        amount_total: item.unit_amount * item.quantity,
        image: None,
      })
      .collect();

    Ok(ProviderSession {
      session_id: session_id.to_string(),
      customer: session.customer.clone(),
      line_items,
      amount_total: Self::amount_total(&session.request),
      status: session.status.clone(),
    })
  }
}
