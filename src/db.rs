use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::{Duration, Instant};
use tracing::{debug, info, Instrument};

use crate::config::DatabaseConfig;
use crate::errors::{error_logging, AppError, AppResult};
use crate::observability;
use crate::orders::{Order, OrderStatus};

/// Read access to the shop's orders, as needed by the order poller
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Most recent `updatedAt` over all orders, `None` when there are none
    async fn latest_update(&self) -> AppResult<Option<DateTime<Utc>>>;

    /// Orders updated strictly after `since`, oldest update first
    async fn updated_since(&self, since: DateTime<Utc>) -> AppResult<Vec<Order>>;
}

#[async_trait]
impl<T: OrderSource + ?Sized> OrderSource for std::sync::Arc<T> {
    async fn latest_update(&self) -> AppResult<Option<DateTime<Utc>>> {
        (**self).latest_update().await
    }

    async fn updated_since(&self, since: DateTime<Utc>) -> AppResult<Vec<Order>> {
        (**self).updated_since(since).await
    }
}

/// Create the connection pool described by the database configuration
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool> {
    info!(
        max_connections = config.max_connections,
        connect_timeout_secs = config.connect_timeout_secs,
        "Initializing database connection pool"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await
        .context("Failed to connect to the order database")
}

/// Check that the database answers a trivial query
pub async fn check_database_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database health check failed")?;

    debug!("Database health check passed");
    Ok(())
}

// Timestamps are stored without time zone and hold UTC
const ORDER_COLUMNS: &str = r#"
    id::text AS id,
    "orderNumber"::text AS order_number,
    COALESCE("firstName", '') AS first_name,
    COALESCE("lastName", '') AS last_name,
    COALESCE(email, '') AS email,
    COALESCE(phone, '') AS phone,
    COALESCE(address, '') AS address,
    COALESCE("shippingMethod"::text, '') AS shipping_method,
    COALESCE(subtotal, 0)::float8 AS subtotal,
    COALESCE(total, 0)::float8 AS total,
    status::text AS status,
    "createdAt" AT TIME ZONE 'UTC' AS created_at,
    "updatedAt" AT TIME ZONE 'UTC' AS updated_at,
    COALESCE(to_jsonb(items), 'null'::jsonb) AS items,
    to_jsonb(coupons) AS coupons
"#;

/// [`OrderSource`] backed by the shop's PostgreSQL `"Order"` table
#[derive(Debug, Clone)]
pub struct PgOrderSource {
    pool: PgPool,
}

impl PgOrderSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn order_from_row(row: &PgRow) -> std::result::Result<Order, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: row.try_get("id")?,
        order_number: row.try_get("order_number")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        shipping_method: row.try_get("shipping_method")?,
        subtotal: row.try_get("subtotal")?,
        total: row.try_get("total")?,
        status: OrderStatus::parse(&status),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        items: row.try_get("items")?,
        coupons: row.try_get("coupons")?,
    })
}

#[async_trait]
impl OrderSource for PgOrderSource {
    async fn latest_update(&self) -> AppResult<Option<DateTime<Utc>>> {
        let span = observability::db_span("latest_update", "Order");
        let start_time = Instant::now();

        let result: std::result::Result<Option<DateTime<Utc>>, sqlx::Error> =
            sqlx::query_scalar(r#"SELECT MAX("updatedAt") AT TIME ZONE 'UTC' FROM "Order""#)
                .fetch_one(&self.pool)
                .instrument(span)
                .await;
        observability::record_db_metrics("latest_update", start_time.elapsed());

        match result {
            Ok(latest) => {
                debug!(latest = ?latest, "Read latest order update");
                Ok(latest)
            }
            Err(e) => {
                error_logging::log_database_error(&e, "latest_update", None);
                Err(AppError::from(e))
            }
        }
    }

    async fn updated_since(&self, since: DateTime<Utc>) -> AppResult<Vec<Order>> {
        let span = observability::db_span("updated_since", "Order");
        let start_time = Instant::now();

        let query = format!(
            r#"SELECT {} FROM "Order" WHERE ("updatedAt" AT TIME ZONE 'UTC') > $1 ORDER BY "updatedAt" ASC"#,
            ORDER_COLUMNS
        );
        let result = sqlx::query(&query)
            .bind(since)
            .fetch_all(&self.pool)
            .instrument(span)
            .await;
        observability::record_db_metrics("updated_since", start_time.elapsed());

        let rows = result.map_err(|e| {
            error_logging::log_database_error(
                &e,
                "updated_since",
                Some(&[("since", &since as &dyn std::fmt::Display)]),
            );
            AppError::from(e)
        })?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                error_logging::log_database_error(&e, "decode_order_row", None);
                AppError::from(e)
            })?;

        debug!(since = %since, count = orders.len(), "Fetched updated orders");
        Ok(orders)
    }
}
