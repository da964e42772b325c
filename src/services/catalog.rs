//! Catalog repository: the product collection the storefront reads and the
//! admin panel mutates. Mutation entry points assume the caller has already
//! been authenticated; the HTTP layer enforces that with the admin key.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::errors::Result as AppResult;
use crate::models::{NewProduct, Product};

#[async_trait]
pub trait CatalogRepository: Send + Sync {
  async fn list(&self) -> AppResult<Vec<Product>>;
  async fn get(&self, id: &str) -> AppResult<Option<Product>>;
  async fn create(&self, data: NewProduct) -> AppResult<Product>;
  /// Replaces the mutable fields of an existing record. `None` if absent.
  async fn update(&self, id: &str, data: NewProduct) -> AppResult<Option<Product>>;
  /// `true` if a record was deleted.
  async fn delete(&self, id: &str) -> AppResult<bool>;
}

fn build_product(id: String, data: NewProduct) -> Product {
  let now = Utc::now();
  Product {
    id,
    name: data.name,
    description: data.description,
    price: data.price,
    original_price: data.original_price,
    category: data.category,
    images: data.images,
    in_stock: data.in_stock,
    stock_count: data.stock_count,
    is_new: data.is_new,
    is_sale: data.is_sale,
    created_at: now,
    updated_at: now,
  }
}

pub struct PgCatalogRepository {
  pool: PgPool,
}

impl PgCatalogRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
  async fn list(&self) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
      r#"
      SELECT id, name, description, price, original_price, category, images,
             in_stock, stock_count, is_new, is_sale, created_at, updated_at
      FROM products
      ORDER BY created_at DESC
      "#,
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(products)
  }

  async fn get(&self, id: &str) -> AppResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
      r#"
      SELECT id, name, description, price, original_price, category, images,
             in_stock, stock_count, is_new, is_sale, created_at, updated_at
      FROM products
      WHERE id = $1
      "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(product)
  }

  async fn create(&self, data: NewProduct) -> AppResult<Product> {
    let product = build_product(Uuid::new_v4().to_string(), data);
    sqlx::query(
      r#"
      INSERT INTO products
        (id, name, description, price, original_price, category, images,
         in_stock, stock_count, is_new, is_sale, created_at, updated_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
      "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.original_price)
    .bind(&product.category)
    .bind(&product.images)
    .bind(product.in_stock)
    .bind(product.stock_count)
    .bind(product.is_new)
    .bind(product.is_sale)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&self.pool)
    .await?;
    info!(action = "product.created", product_id = %product.id, name = %product.name, category = %product.category, "New product added");
    Ok(product)
  }

  async fn update(&self, id: &str, data: NewProduct) -> AppResult<Option<Product>> {
    let result = sqlx::query(
      r#"
      UPDATE products SET
        name = $2, description = $3, price = $4, original_price = $5,
        category = $6, images = $7, in_stock = $8, stock_count = $9,
        is_new = $10, is_sale = $11, updated_at = $12
      WHERE id = $1
      "#,
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.original_price)
    .bind(&data.category)
    .bind(&data.images)
    .bind(data.in_stock)
    .bind(data.stock_count)
    .bind(data.is_new)
    .bind(data.is_sale)
    .bind(Utc::now())
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Ok(None);
    }
    info!(action = "product.updated", product_id = %id, "Product updated");
    self.get(id).await
  }

  async fn delete(&self, id: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    let deleted = result.rows_affected() > 0;
    if deleted {
      info!(action = "product.deleted", product_id = %id, "Product deleted");
    }
    Ok(deleted)
  }
}

/// Seeds a handful of sample products into an empty catalog. A no-op when
/// the catalog already has records, so restarts do not duplicate them.
pub async fn seed_sample_products(catalog: &dyn CatalogRepository) -> AppResult<()> {
  if !catalog.list().await?.is_empty() {
    info!("Catalog already populated; skipping seed.");
    return Ok(());
  }

  let samples = [
    NewProduct {
      name: "Handwoven Sisal Basket".to_string(),
      description: Some("Medium sisal basket with leather handles.".to_string()),
      price: 1000,
      original_price: None,
      category: "baskets".to_string(),
      images: vec![],
      in_stock: true,
      stock_count: 12,
      is_new: true,
      is_sale: false,
    },
    NewProduct {
      name: "Glazed Clay Mug".to_string(),
      description: Some("Hand-thrown mug, matte glaze.".to_string()),
      price: 500,
      original_price: Some(650),
      category: "ceramics".to_string(),
      images: vec![],
      in_stock: true,
      stock_count: 30,
      is_new: false,
      is_sale: true,
    },
    NewProduct {
      name: "Beaded Wall Hanging".to_string(),
      description: None,
      price: 2400,
      original_price: None,
      category: "decor".to_string(),
      images: vec![],
      in_stock: true,
      stock_count: 4,
      is_new: false,
      is_sale: false,
    },
  ];

  for sample in samples {
    catalog.create(sample).await?;
  }
  info!("Seeded sample products into the catalog.");
  Ok(())
}

/// In-memory catalog for tests and credential-less local runs.
#[derive(Clone, Default)]
pub struct InMemoryCatalogRepository {
  products: Arc<RwLock<HashMap<String, Product>>>,
}

impl InMemoryCatalogRepository {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
  async fn list(&self) -> AppResult<Vec<Product>> {
    let mut products: Vec<Product> = self.products.read().values().cloned().collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    Ok(products)
  }

  async fn get(&self, id: &str) -> AppResult<Option<Product>> {
    Ok(self.products.read().get(id).cloned())
  }

  async fn create(&self, data: NewProduct) -> AppResult<Product> {
    let product = build_product(Uuid::new_v4().to_string(), data);
    info!(action = "product.created", product_id = %product.id, name = %product.name, "New product added");
    self.products.write().insert(product.id.clone(), product.clone());
    Ok(product)
  }

  async fn update(&self, id: &str, data: NewProduct) -> AppResult<Option<Product>> {
    let mut products = self.products.write();
    let Some(existing) = products.get_mut(id) else {
      return Ok(None);
    };
    let mut updated = build_product(id.to_string(), data);
    updated.created_at = existing.created_at;
    *existing = updated.clone();
    info!(action = "product.updated", product_id = %id, "Product updated");
    Ok(Some(updated))
  }

  async fn delete(&self, id: &str) -> AppResult<bool> {
    let deleted = self.products.write().remove(id).is_some();
    if deleted {
      info!(action = "product.deleted", product_id = %id, "Product deleted");
    }
    Ok(deleted)
  }
}
