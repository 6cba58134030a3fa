//! Payment-status endpoint: look a payment up at the gateway, reconcile its
//! order and report the result to the storefront.

use axum::{body::Bytes, extract::{rejection::QueryRejection, Query, State}, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::AppState;
use crate::domain::aggregates::OrderStatus;
use crate::error::ApiError;
use crate::gateway::GatewayPayment;
use crate::store::NotificationSource;

#[derive(Debug, Default, Deserialize)]
pub struct PaymentIdQuery {
    pub payment_id: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Validate)]
pub(super) struct PaymentId {
    #[validate(length(min = 1, max = 64), custom = "validate_payment_id")]
    pub value: String,
}

fn validate_payment_id(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("payment_id_charset"))
    }
}

impl PaymentId {
    pub(super) fn parse(raw: Option<String>) -> Result<Self, ApiError> {
        let value = raw.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()).ok_or_else(|| ApiError::BadRequest("payment_id is required".into()))?;
        let id = Self { value };
        id.validate().map_err(|_| ApiError::BadRequest("payment_id is malformed".into()))?;
        Ok(id)
    }
}

/// Extracts a string from a JSON string or number.
pub(super) fn json_id(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub payment_id: String,
    pub status: String,
    pub status_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
}

impl PaymentStatusResponse {
    fn new(payment: GatewayPayment, order_id: Option<Uuid>, order_status: Option<OrderStatus>) -> Self {
        let pix = payment.pix_data().cloned().unwrap_or_default();
        Self {
            payment_id: payment.id,
            status: payment.status,
            status_detail: payment.status_detail,
            order_id,
            order_status,
            qr_code: pix.qr_code,
            qr_code_base64: pix.qr_code_base64,
            ticket_url: pix.ticket_url,
        }
    }
}

pub(super) async fn status_from_query(
    State(s): State<AppState>,
    query: Result<Query<PaymentIdQuery>, QueryRejection>,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let Query(q) = query?;
    lookup(&s, q.payment_id.or(q.id)).await
}

pub(super) async fn status_from_body(
    State(s): State<AppState>,
    query: Result<Query<PaymentIdQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let Query(q) = query?;
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
        json_id(value.get("payment_id")).or_else(|| json_id(value.get("id")))
    };
    lookup(&s, from_body.or(q.payment_id).or(q.id)).await
}

async fn lookup(s: &AppState, raw_id: Option<String>) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let gateway = s.gateway()?;
    let payment_id = PaymentId::parse(raw_id)?;

    let payment = gateway.fetch_payment(&payment_id.value).await?;
    let outcome = s.reconciler.reconcile(&payment, NotificationSource::Poll).await;
    tracing::info!(payment_id = %payment.id, status = %payment.status, ?outcome, "payment status checked");

    Ok(Json(PaymentStatusResponse::new(payment, outcome.order_id(), outcome.order_status())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_id_validation() {
        assert_eq!(PaymentId::parse(Some(" 123 ".into())).unwrap().value, "123");
        assert!(matches!(PaymentId::parse(None), Err(ApiError::BadRequest(_))));
        assert!(matches!(PaymentId::parse(Some("   ".into())), Err(ApiError::BadRequest(_))));
        assert!(matches!(PaymentId::parse(Some("../admin".into())), Err(ApiError::BadRequest(_))));
        assert!(matches!(PaymentId::parse(Some("9".repeat(65))), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_json_id_accepts_numbers() {
        let v = serde_json::json!({"a": 12, "b": "x", "c": true});
        assert_eq!(json_id(v.get("a")).as_deref(), Some("12"));
        assert_eq!(json_id(v.get("b")).as_deref(), Some("x"));
        assert_eq!(json_id(v.get("c")), None);
        assert_eq!(json_id(v.get("missing")), None);
    }
}
