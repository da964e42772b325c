use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::webhook::{WebhookOutcome, SIGNATURE_HEADER};
use crate::state::AppState;

/// Payment-provider callback. The body must stay raw (`web::Bytes`): the
/// signature is computed over the exact bytes on the wire, so any
/// parse-then-reserialize step would break verification.
#[instrument(
    name = "handler::payment_webhook",
    skip(app_state, req, body),
    fields(payload_bytes = body.len())
)]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h_val| h_val.to_str().ok());

  // Error mapping carries the retry contract: AppError::Signature answers
  // 400 (illegitimate payload, no retry wanted) while a store-write failure
  // answers 5xx so the provider redelivers the event.
  let outcome = app_state.reconciler.handle(&body, signature_header).await?;

  match &outcome {
    WebhookOutcome::Recorded { session_id } => {
      info!(session_id = %session_id, "Webhook processed; order recorded");
    }
    WebhookOutcome::Ignored { event_type } => {
      info!(event_type = %event_type, "Webhook acknowledged without action");
    }
  }
  Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
