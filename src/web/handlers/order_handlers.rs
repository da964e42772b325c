use actix_web::{web, HttpResponse};
use tracing::instrument;

use crate::errors::AppError;
use crate::services::orders::lookup_order;
use crate::state::AppState;

/// Confirmation-page read: resolves the session id from the success
/// redirect into a denormalized order view, straight from the provider.
#[instrument(name = "handler::get_order", skip(app_state, session_id), fields(session_id = %session_id.as_str()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let view = lookup_order(app_state.payments.as_ref(), &session_id).await?;
  Ok(HttpResponse::Ok().json(view))
}
