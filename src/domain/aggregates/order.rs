//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::value_objects::{Money, MoneyError, PaymentMethod};

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    order_number: String,
    status: OrderStatus,
    payment_method: PaymentMethod,
    subtotal: Money,
    shipping: Money,
    total: Money,
    gateway_payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Paid, Declined, Cancelled, Refunded, Disputed }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Disputed => "disputed",
        }
    }

    /// Whether a payment reaching this status may take the order over from
    /// the payment that last moved it.
    pub fn supersedes_other_payments(&self) -> bool { matches!(self, Self::Paid) }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "declined" => Ok(Self::Declined),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            "disputed" => Ok(Self::Disputed),
            other => Err(OrderError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A status change that actually happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusChange { pub from: OrderStatus, pub to: OrderStatus }

/// Result of feeding one payment's status to an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentTransition {
    Applied(StatusChange),
    Unchanged,
    /// The order is tied to another payment and this one may not move it.
    Superseded,
}

/// Fields of an order as stored, used to rebuild the aggregate from a row.
#[derive(Clone, Debug)]
pub struct OrderRecord {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn create(order_number: impl Into<String>, payment_method: PaymentMethod, subtotal: Money, shipping: Money) -> Result<Self, OrderError> {
        let total = subtotal.add(&shipping)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), order_number: order_number.into(),
            status: OrderStatus::Pending, payment_method, subtotal, shipping, total,
            gateway_payment_id: None, created_at: now, updated_at: now,
        })
    }

    pub fn from_record(r: OrderRecord) -> Self {
        Self {
            id: r.id, order_number: r.order_number, status: r.status,
            payment_method: r.payment_method, subtotal: r.subtotal, shipping: r.shipping, total: r.total,
            gateway_payment_id: r.gateway_payment_id, created_at: r.created_at, updated_at: r.updated_at,
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn shipping(&self) -> &Money { &self.shipping }
    pub fn total(&self) -> &Money { &self.total }
    pub fn gateway_payment_id(&self) -> Option<&str> { self.gateway_payment_id.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Moves the order to the status the gateway reports for one of its
    /// payments. Once a payment has moved the order, other payments may only
    /// move it by being approved; a late notification for an abandoned
    /// attempt leaves the order alone.
    pub fn apply_payment_status(&mut self, status: OrderStatus, gateway_payment_id: &str) -> PaymentTransition {
        if self.status == status { return PaymentTransition::Unchanged; }
        let same_payment = self.gateway_payment_id.as_deref().map_or(true, |id| id == gateway_payment_id);
        if !same_payment && !status.supersedes_other_payments() { return PaymentTransition::Superseded; }
        let change = StatusChange { from: self.status, to: status };
        self.status = status;
        self.gateway_payment_id = Some(gateway_payment_id.to_owned());
        self.touch();
        PaymentTransition::Applied(change)
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone)] pub enum OrderError { UnknownStatus(String), Money(MoneyError) }
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::UnknownStatus(s) => write!(f, "Unknown order status: {s}"), Self::Money(e) => write!(f, "{e}") }
    }
}
impl From<MoneyError> for OrderError { fn from(e: MoneyError) -> Self { Self::Money(e) } }
