use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use super::{OrderRepository, PaymentNotification, PaymentStatusUpdate, StoreError, TransitionOutcome};
use crate::domain::aggregates::{Order, OrderRecord, OrderStatus, StatusChange};
use crate::domain::value_objects::{Money, PaymentMethod};

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Opens a pool and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus, StoreError> {
    raw.parse().map_err(|e: crate::domain::aggregates::OrderError| StoreError::CorruptRow { table: "orders", message: e.to_string() })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let currency: String = row.try_get("currency")?;
    let money = |column: &str| -> Result<Money, StoreError> {
        let amount: Decimal = row.try_get(column)?;
        Ok(Money::new(amount, &currency))
    };
    let status: String = row.try_get("status")?;
    let payment_method: String = row.try_get("payment_method")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Order::from_record(OrderRecord {
        id: row.try_get("id")?,
        order_number: row.try_get("order_number")?,
        status: parse_status(&status)?,
        payment_method: PaymentMethod::from_db(&payment_method),
        subtotal: money("subtotal")?,
        shipping: money("shipping")?,
        total: money("total")?,
        gateway_payment_id: row.try_get("gateway_payment_id")?,
        created_at,
        updated_at,
    }))
}

#[async_trait]
impl OrderRepository for PgOrderStore {
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            "SELECT id, order_number, status, payment_method, subtotal, shipping, total, currency, gateway_payment_id, created_at, updated_at FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn apply_payment_status(&self, update: &PaymentStatusUpdate) -> Result<TransitionOutcome, StoreError> {
        let row = sqlx::query(
            r#"
            WITH prev AS (
                SELECT id, status FROM orders WHERE id = $1 FOR UPDATE
            )
            UPDATE orders o
            SET status = $2, gateway_payment_id = $3, updated_at = NOW()
            FROM prev
            WHERE o.id = prev.id
              AND o.status <> $2
              AND (o.gateway_payment_id IS NULL OR o.gateway_payment_id = $3 OR $4)
            RETURNING prev.status AS previous_status
            "#,
        )
        .bind(update.order_id)
        .bind(update.status.as_str())
        .bind(&update.gateway_payment_id)
        .bind(update.status.supersedes_other_payments())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let previous: String = row.try_get("previous_status")?;
            return Ok(TransitionOutcome::Applied(StatusChange { from: parse_status(&previous)?, to: update.status }));
        }

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(update.order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match current {
            None => TransitionOutcome::OrderMissing,
            Some(raw) => match parse_status(&raw)? {
                current if current == update.status => TransitionOutcome::Unchanged,
                current => TransitionOutcome::Superseded { current },
            },
        })
    }

    async fn record_notification(&self, notification: &PaymentNotification) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO payment_notifications (id, gateway_payment_id, raw_status, status_detail, order_id, source, received_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (gateway_payment_id, raw_status, source) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&notification.gateway_payment_id)
        .bind(&notification.raw_status)
        .bind(&notification.status_detail)
        .bind(notification.order_id)
        .bind(notification.source.as_str())
        .bind(notification.received_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
