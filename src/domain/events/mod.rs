//! Domain events
use crate::domain::aggregates::{OrderStatus, StatusChange};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    PaymentStatusChanged { order_id: Uuid, gateway_payment_id: String, from: OrderStatus, to: OrderStatus },
}

impl OrderEvent {
    pub fn payment_status_changed(order_id: Uuid, gateway_payment_id: impl Into<String>, change: StatusChange) -> Self {
        Self::PaymentStatusChanged { order_id, gateway_payment_id: gateway_payment_id.into(), from: change.from, to: change.to }
    }

    pub fn subject(&self) -> &'static str {
        match self { Self::PaymentStatusChanged { .. } => "orders.payment_status_changed" }
    }
}
