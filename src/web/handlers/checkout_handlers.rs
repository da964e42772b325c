use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::CartLine;
use crate::state::AppState;

/// The cart contents at the moment the shopper pressed "place order". The
/// client must disable re-submission while this request is outstanding;
/// firing it twice creates two provider sessions for one cart.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequestPayload {
  pub items: Vec<CartLine>,
}

#[instrument(
    name = "handler::start_checkout",
    skip(app_state, req_payload),
    fields(line_count = req_payload.items.len())
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CheckoutRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let redirect = app_state.checkout.initiate(&req_payload.items).await?;

  info!(session_id = %redirect.session_id, "Checkout session initiated");
  Ok(HttpResponse::Ok().json(json!({
      "sessionId": redirect.session_id,
      "url": redirect.checkout_url,
  })))
}
