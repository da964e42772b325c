use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::NewProduct;
use crate::state::AppState;

/// Extractor gating the admin catalog mutations behind the shared admin
/// key. Stands in for the session-based admin authentication the wider
/// system enforces in front of these entry points.
#[derive(Debug)]
pub struct AdminKey;

impl FromRequest for AdminKey {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let expected = req
      .app_data::<web::Data<AppState>>()
      .map(|state| state.config.admin_api_key.clone());

    let provided = req
      .headers()
      .get("X-Admin-Key")
      .and_then(|h| h.to_str().ok())
      .map(String::from);

    match (expected, provided) {
      (Some(expected), Some(provided)) if expected == provided => futures_util::future::ready(Ok(AdminKey)),
      _ => {
        warn!("AdminKey extractor: missing or invalid X-Admin-Key header.");
        futures_util::future::ready(Err(AppError::Auth(
          "Admin authentication required. Missing or invalid X-Admin-Key header.".to_string(),
        )))
      }
    }
  }
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = app_state.catalog.list().await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, product_id), fields(product_id = %product_id.as_str()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  product_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .catalog
    .get(&product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", product_id)))?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::create_product", skip(app_state, req_payload, _admin), fields(name = %req_payload.name))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewProduct>,
  _admin: AdminKey,
) -> Result<HttpResponse, AppError> {
  if req_payload.price <= 0 {
    return Err(AppError::Validation("Product price must be positive".to_string()));
  }
  let product = app_state.catalog.create(req_payload.into_inner()).await?;
  info!(product_id = %product.id, "Product created");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, product_id, req_payload, _admin), fields(product_id = %product_id.as_str()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  product_id: web::Path<String>,
  req_payload: web::Json<NewProduct>,
  _admin: AdminKey,
) -> Result<HttpResponse, AppError> {
  if req_payload.price <= 0 {
    return Err(AppError::Validation("Product price must be positive".to_string()));
  }
  let product = app_state
    .catalog
    .update(&product_id, req_payload.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", product_id)))?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, product_id, _admin), fields(product_id = %product_id.as_str()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  product_id: web::Path<String>,
  _admin: AdminKey,
) -> Result<HttpResponse, AppError> {
  let deleted = app_state.catalog.delete(&product_id).await?;
  if !deleted {
    return Err(AppError::NotFound(format!("Product '{}' not found", product_id)));
  }
  Ok(HttpResponse::NoContent().finish())
}
