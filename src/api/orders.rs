//! Read access to orders for the storefront.

use axum::{extract::{rejection::PathRejection, Path, State}, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::AppState;
use crate::domain::aggregates::{Order, OrderStatus};
use crate::domain::value_objects::{Money, PaymentMethod};
use crate::error::ApiError;

/// What the order endpoint exposes. Customer details stay out: the route is
/// unauthenticated.
#[derive(Debug, Serialize)]
pub struct OrderView {
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

impl From<&Order> for OrderView {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id(),
            order_number: o.order_number().to_owned(),
            status: o.status(),
            payment_method: o.payment_method(),
            subtotal: o.subtotal().clone(),
            shipping: o.shipping().clone(),
            total: o.total().clone(),
            gateway_payment_id: o.gateway_payment_id().map(str::to_owned),
            created_at: o.created_at(),
            updated_at: o.updated_at(),
        }
    }
}

pub(super) async fn get_order(State(s): State<AppState>, path: Result<Path<Uuid>, PathRejection>) -> Result<Json<OrderView>, ApiError> {
    let Path(id) = path?;
    let order = s.store.find_order(id).await.map_err(|e| {
        tracing::error!(order_id = %id, error = %e, "failed to load order");
        ApiError::Internal
    })?;
    order.as_ref().map(OrderView::from).map(Json).ok_or(ApiError::NotFound("order"))
}
