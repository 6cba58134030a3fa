//! Push notifications from the gateway.
//!
//! The gateway sends the same notification in several shapes: a JSON body
//! with `type` and `data.id`, query parameters `type` and `data.id`, or the
//! legacy `topic` and `id` pair. The notification only says *which* payment
//! changed; its status is always re-fetched from the gateway.

use std::collections::HashMap;

use axum::{body::Bytes, extract::{rejection::QueryRejection, Query, State}, http::HeaderMap, Json};
use serde::Serialize;

use super::payments::{json_id, PaymentId};
use super::AppState;
use crate::error::ApiError;
use crate::reconcile::Reconciliation;
use crate::signature;
use crate::store::NotificationSource;

#[derive(Debug, PartialEq, Eq)]
pub(super) struct Notification {
    pub topic: Option<String>,
    pub id: Option<String>,
}

impl Notification {
    pub(super) fn parse(query: &HashMap<String, String>, body: &[u8]) -> Result<Self, ApiError> {
        let json = if body.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?
        };

        let topic = json_id(json.get("type"))
            .or_else(|| json_id(json.get("topic")))
            .or_else(|| query.get("type").cloned())
            .or_else(|| query.get("topic").cloned());

        let id = json
            .get("data")
            .and_then(|d| json_id(d.get("id")))
            .or_else(|| json_id(json.get("resource")).map(|r| resource_id(&r)))
            .or_else(|| query.get("data.id").cloned())
            .or_else(|| query.get("id").cloned());

        Ok(Self { topic, id })
    }

    pub(super) fn is_payment(&self) -> bool {
        self.topic.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("payment"))
    }
}

/// Legacy notifications send the payment as a resource URL; the id is its
/// last path segment.
fn resource_id(resource: &str) -> String {
    resource.trim_end_matches('/').rsplit('/').next().unwrap_or(resource).to_owned()
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<Reconciliation>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
}

pub(super) async fn receive(
    State(s): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let Query(query) = query?;
    let notification = Notification::parse(&query, &body)?;
    if !notification.is_payment() {
        tracing::info!(topic = ?notification.topic, "ignoring non-payment notification");
        return Ok(Json(WebhookAck { received: true, payment_id: None, status: None, reconciliation: None, ignored: true }));
    }

    let gateway = s.gateway()?;
    let payment_id = PaymentId::parse(notification.id)?;

    if let Some(secret) = &s.webhook_secret {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        signature::verify(secret, header("x-signature"), header("x-request-id"), &payment_id.value)?;
    }

    let payment = gateway.fetch_payment(&payment_id.value).await?;
    let outcome = s.reconciler.reconcile(&payment, NotificationSource::Webhook).await;
    tracing::info!(payment_id = %payment.id, status = %payment.status, ?outcome, "payment notification processed");

    Ok(Json(WebhookAck { received: true, payment_id: Some(payment.id), status: Some(payment.status), reconciliation: Some(outcome), ignored: false }))
}
