//! Order persistence.
//!
//! [`OrderRepository`] is the seam between reconciliation and storage.
//! [`PgOrderStore`] backs the running service; [`MemoryOrderStore`] keeps
//! everything in process for local runs and tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus, StatusChange};

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Where a notification came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSource { Webhook, Poll }

impl NotificationSource {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Webhook => "webhook", Self::Poll => "poll" }
    }
}

/// The single conditional write reconciliation performs.
#[derive(Clone, Debug)]
pub struct PaymentStatusUpdate {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub gateway_payment_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied(StatusChange),
    Unchanged,
    /// Another payment owns the order; it keeps `current`.
    Superseded { current: OrderStatus },
    OrderMissing,
}

/// One row of the payment notification log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentNotification {
    pub gateway_payment_id: String,
    pub raw_status: String,
    pub status_detail: Option<String>,
    pub order_id: Option<Uuid>,
    pub source: NotificationSource,
    pub received_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Sets the order status only when it differs from the stored one and
    /// the payment may move the order (see [`Order::apply_payment_status`]).
    async fn apply_payment_status(&self, update: &PaymentStatusUpdate) -> Result<TransitionOutcome, StoreError>;

    /// Appends to the notification log. Redelivery of the same
    /// (payment, status, source) triple is ignored.
    async fn record_notification(&self, notification: &PaymentNotification) -> Result<(), StoreError>;
}
