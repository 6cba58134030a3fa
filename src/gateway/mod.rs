//! Payment gateway integration.
mod client;
mod error;
mod types;

pub use client::GatewayClient;
pub use error::GatewayError;
pub use types::{GatewayPayment, PointOfInteraction, TransactionData};
