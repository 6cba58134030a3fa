//! HTTP client for the payment gateway REST API.
//!
//! Wraps `reqwest` with bearer authentication and typed response
//! deserialization. Failures are never retried here; the gateway redelivers
//! notifications on its own schedule.

use std::time::Duration;

use reqwest::{Client, Url};

use super::error::GatewayError;
use super::types::GatewayPayment;
use crate::config::{GatewayConfig, DEFAULT_GATEWAY_BASE_URL};

/// Longest slice of an upstream error body kept for logs and responses.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Client for the gateway's payments API.
///
/// Use [`GatewayClient::new`] for production or
/// [`GatewayClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    access_token: String,
    base_url: Url,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Creates a client pointed at the production gateway.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(access_token: &str, timeout_secs: u64) -> Result<Self, GatewayError> {
        Self::with_base_url(access_token, timeout_secs, DEFAULT_GATEWAY_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`GatewayError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(access_token: &str, timeout_secs: u64, base_url: &str) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("storefront-payments/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GatewayError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self { client, access_token: access_token.to_owned(), base_url })
    }

    /// Builds a client from configuration, or `None` when no access token is
    /// configured.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayClient::with_base_url`].
    pub fn from_config(config: &GatewayConfig) -> Result<Option<Self>, GatewayError> {
        config
            .access_token
            .as_deref()
            .map(|token| Self::with_base_url(token, config.timeout_secs, &config.base_url))
            .transpose()
    }

    /// Fetches the current state of a payment.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Http`] on network failure or timeout.
    /// - [`GatewayError::Status`] when the gateway answers with a non-2xx status.
    /// - [`GatewayError::Deserialize`] if the body does not match [`GatewayPayment`].
    pub async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let url = self.payment_url(payment_id)?;
        tracing::debug!(payment_id, "fetching payment from gateway");

        let response = self.client.get(url).bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Status { status: status.as_u16(), body: body.chars().take(MAX_ERROR_BODY_CHARS).collect() });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Deserialize { context: format!("payment {payment_id}"), source: e })
    }

    fn payment_url(&self, payment_id: &str) -> Result<Url, GatewayError> {
        let mut url = self.base_url.join("v1/payments/").map_err(|e| GatewayError::InvalidBaseUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(payment_id);
        Ok(url)
    }
}
