//! HTTP surface of the service.

mod orders;
mod payments;
mod webhook;

use std::sync::Arc;

use axum::{routing::{get, post}, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::events::EventPublisher;
use crate::gateway::GatewayClient;
use crate::reconcile::Reconciler;
use crate::store::OrderRepository;

pub use orders::OrderView;
pub use payments::PaymentStatusResponse;
pub use webhook::WebhookAck;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderRepository>,
    pub gateway: Option<GatewayClient>,
    pub reconciler: Reconciler,
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn OrderRepository>, gateway: Option<GatewayClient>, events: EventPublisher, webhook_secret: Option<String>) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&store), events);
        Self { store, gateway, reconciler, webhook_secret }
    }

    /// The gateway client, or a configuration error when no access token
    /// was provided.
    fn gateway(&self) -> Result<&GatewayClient, ApiError> {
        self.gateway.as_ref().ok_or(ApiError::MissingConfig("GATEWAY_ACCESS_TOKEN"))
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-payments"})) }))
        .route(
            "/api/payments/status",
            get(payments::status_from_query).post(payments::status_from_body).fallback(method_not_allowed),
        )
        .route("/api/payments/webhook", post(webhook::receive).fallback(method_not_allowed))
        .route("/api/v1/orders/:id", get(orders::get_order))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn method_not_allowed() -> ApiError { ApiError::MethodNotAllowed }

async fn route_not_found() -> ApiError { ApiError::NotFound("route") }
