//! Publication of order events to NATS.

use crate::domain::events::OrderEvent;

/// Publishes order events when a NATS connection is configured; otherwise
/// events are only logged.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self::default() }

    /// Connects to NATS, falling back to a disabled publisher if the server
    /// cannot be reached.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(url, "connected to NATS");
                Self::new(Some(client))
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "NATS unavailable, order events will not be published");
                Self::disabled()
            }
        }
    }

    /// Best effort: failures are logged and never surfaced.
    pub async fn publish(&self, event: &OrderEvent) {
        let subject = event.subject();
        let Some(nats) = &self.nats else {
            tracing::debug!(subject, ?event, "event publishing disabled");
            return;
        };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(subject, error = %e, "failed to encode order event");
                return;
            }
        };
        if let Err(e) = nats.publish(subject.to_owned(), payload.into()).await {
            tracing::warn!(subject, error = %e, "failed to publish order event");
        }
    }
}
