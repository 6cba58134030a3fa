//! Reconciliation of gateway payments with order records.
//!
//! Each call maps the payment's latest gateway status to an order status and
//! performs at most one conditional write. Storage failures are logged and
//! swallowed so the caller can still acknowledge the notification.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{OrderStatus, StatusChange};
use crate::domain::events::OrderEvent;
use crate::domain::payment_status::map_to_order_status;
use crate::events::EventPublisher;
use crate::gateway::GatewayPayment;
use crate::store::{NotificationSource, OrderRepository, PaymentNotification, PaymentStatusUpdate, TransitionOutcome};

/// What reconciling one payment did to its order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Reconciliation {
    Applied { order_id: Uuid, from: OrderStatus, to: OrderStatus },
    Unchanged { order_id: Uuid, status: OrderStatus },
    /// A newer payment already moved the order; it keeps `status`.
    Superseded { order_id: Uuid, status: OrderStatus },
    /// The gateway status has no order-level meaning.
    Unmapped,
    /// The payment does not reference a known order.
    NoOrder,
    StoreFailed,
}

impl Reconciliation {
    pub fn order_id(&self) -> Option<Uuid> {
        match self {
            Self::Applied { order_id, .. } | Self::Unchanged { order_id, .. } | Self::Superseded { order_id, .. } => Some(*order_id),
            Self::Unmapped | Self::NoOrder | Self::StoreFailed => None,
        }
    }

    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            Self::Applied { to, .. } => Some(*to),
            Self::Unchanged { status, .. } | Self::Superseded { status, .. } => Some(*status),
            Self::Unmapped | Self::NoOrder | Self::StoreFailed => None,
        }
    }
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn OrderRepository>,
    events: EventPublisher,
}

impl Reconciler {
    pub fn new(store: Arc<dyn OrderRepository>, events: EventPublisher) -> Self { Self { store, events } }

    pub async fn reconcile(&self, payment: &GatewayPayment, source: NotificationSource) -> Reconciliation {
        let gateway_status = payment.gateway_status();
        let order_id = payment.external_reference.as_deref().and_then(|r| Uuid::parse_str(r.trim()).ok());

        let outcome = match (order_id, map_to_order_status(&gateway_status)) {
            (None, _) => {
                tracing::info!(payment_id = %payment.id, reference = ?payment.external_reference, "payment has no order reference");
                Reconciliation::NoOrder
            }
            (Some(_), None) => {
                tracing::warn!(payment_id = %payment.id, status = %gateway_status, "unmapped gateway status, order left untouched");
                Reconciliation::Unmapped
            }
            (Some(order_id), Some(status)) => self.transition(order_id, status, &payment.id).await,
        };

        let logged_order = match outcome {
            Reconciliation::NoOrder | Reconciliation::StoreFailed => None,
            _ => order_id,
        };
        let notification = PaymentNotification {
            gateway_payment_id: payment.id.clone(),
            raw_status: payment.status.clone(),
            status_detail: payment.status_detail.clone(),
            order_id: logged_order,
            source,
            received_at: Utc::now(),
        };
        if let Err(e) = self.store.record_notification(&notification).await {
            tracing::warn!(payment_id = %payment.id, error = %e, "failed to record payment notification");
        }

        outcome
    }

    async fn transition(&self, order_id: Uuid, status: OrderStatus, gateway_payment_id: &str) -> Reconciliation {
        let update = PaymentStatusUpdate { order_id, status, gateway_payment_id: gateway_payment_id.to_owned() };
        match self.store.apply_payment_status(&update).await {
            Ok(TransitionOutcome::Applied(change)) => {
                tracing::info!(%order_id, payment_id = gateway_payment_id, from = %change.from, to = %change.to, "order status updated");
                self.publish(order_id, gateway_payment_id, change).await;
                Reconciliation::Applied { order_id, from: change.from, to: change.to }
            }
            Ok(TransitionOutcome::Unchanged) => {
                tracing::debug!(%order_id, %status, "order already in gateway status");
                Reconciliation::Unchanged { order_id, status }
            }
            Ok(TransitionOutcome::Superseded { current }) => {
                tracing::info!(%order_id, payment_id = gateway_payment_id, %status, %current, "order belongs to a newer payment, left untouched");
                Reconciliation::Superseded { order_id, status: current }
            }
            Ok(TransitionOutcome::OrderMissing) => {
                tracing::warn!(%order_id, payment_id = gateway_payment_id, "payment references unknown order");
                Reconciliation::NoOrder
            }
            Err(e) => {
                tracing::error!(%order_id, payment_id = gateway_payment_id, error = %e, "failed to update order status");
                Reconciliation::StoreFailed
            }
        }
    }

    async fn publish(&self, order_id: Uuid, gateway_payment_id: &str, change: StatusChange) {
        self.events.publish(&OrderEvent::payment_status_changed(order_id, gateway_payment_id, change)).await;
    }
}
