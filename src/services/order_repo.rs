//! Durable order records, keyed by checkout-session id.
//!
//! Both write paths — the provisional write at checkout time and the
//! completion write from the webhook reconciler — go through [`OrderRepository::put`],
//! a full-record upsert. Concurrent or redelivered writes for the same
//! session therefore converge regardless of arrival order.

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{AppError, Result as AppResult};
use crate::models::{OrderLine, OrderRecord, OrderStatus};

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Creates the record if absent or overwrites it if present.
  async fn put(&self, record: &OrderRecord) -> AppResult<()>;

  async fn get(&self, session_id: &str) -> AppResult<Option<OrderRecord>>;
}

/// Postgres-backed repository. Line-item snapshots are stored as JSONB; the
/// upsert is `INSERT ... ON CONFLICT (session_id) DO UPDATE`.
pub struct PgOrderRepository {
  pool: PgPool,
}

impl PgOrderRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
  async fn put(&self, record: &OrderRecord) -> AppResult<()> {
    sqlx::query(
      r#"
      INSERT INTO orders
        (session_id, items, status, customer_name, email, amount_total_cents, created_at, updated_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
      ON CONFLICT (session_id) DO UPDATE SET
        items = EXCLUDED.items,
        status = EXCLUDED.status,
        customer_name = EXCLUDED.customer_name,
        email = EXCLUDED.email,
        amount_total_cents = EXCLUDED.amount_total_cents,
        created_at = EXCLUDED.created_at,
        updated_at = EXCLUDED.updated_at
      "#,
    )
    .bind(&record.session_id)
    .bind(sqlx::types::Json(&record.items))
    .bind(record.status.as_str())
    .bind(&record.customer_name)
    .bind(&record.email)
    .bind(record.amount_total_cents)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn get(&self, session_id: &str) -> AppResult<Option<OrderRecord>> {
    let row = sqlx::query(
      r#"
      SELECT session_id, items, status, customer_name, email, amount_total_cents, created_at, updated_at
      FROM orders
      WHERE session_id = $1
      "#,
    )
    .bind(session_id)
    .fetch_optional(&self.pool)
    .await?;

    let Some(row) = row else {
      return Ok(None);
    };

    let status_raw: String = row.try_get("status")?;
    let status = OrderStatus::parse(&status_raw)
      .ok_or_else(|| AppError::Internal(format!("Order {} has unknown status '{}'", session_id, status_raw)))?;
    let items: sqlx::types::Json<Vec<OrderLine>> = row.try_get("items")?;

    Ok(Some(OrderRecord {
      session_id: row.try_get("session_id")?,
      items: items.0,
      status,
      customer_name: row.try_get("customer_name")?,
      email: row.try_get("email")?,
      amount_total_cents: row.try_get("amount_total_cents")?,
      created_at: row.try_get("created_at")?,
      updated_at: row.try_get("updated_at")?,
    }))
  }
}

/// In-memory repository for tests and credential-less local runs.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
  records: Arc<RwLock<HashMap<String, OrderRecord>>>,
  fail_writes: Arc<RwLock<bool>>,
}

impl InMemoryOrderRepository {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes every subsequent `put` fail, simulating a store outage. Lets
  /// tests assert the webhook endpoint answers 5xx so the provider retries.
  pub fn fail_writes(&self, fail: bool) {
    *self.fail_writes.write() = fail;
  }

  pub fn len(&self) -> usize {
    self.records.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.read().is_empty()
  }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
  async fn put(&self, record: &OrderRecord) -> AppResult<()> {
    if *self.fail_writes.read() {
      return Err(AppError::Internal("Simulated order store write failure".to_string()));
    }
    self.records.write().insert(record.session_id.clone(), record.clone());
    Ok(())
  }

  async fn get(&self, session_id: &str) -> AppResult<Option<OrderRecord>> {
    Ok(self.records.read().get(session_id).cloned())
  }
}
