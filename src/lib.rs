//! Storefront Payments
//!
//! Reconciles storefront orders with the payment gateway.
//!
//! ## Features
//! - Payment-status lookup for the checkout page (polling)
//! - Gateway webhook intake (push)
//! - Gateway status to order status mapping
//! - Idempotent order updates with a notification log
//! - Order status change events over NATS

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod gateway;
pub mod reconcile;
pub mod signature;
pub mod store;

pub use api::{build_app, AppState};
pub use config::{Config, ConfigError, GatewayConfig};
pub use domain::aggregates::{Order, OrderStatus, StatusChange};
pub use domain::payment_status::{map_to_order_status, GatewayStatus};
pub use domain::value_objects::{Money, PaymentMethod};
pub use error::ApiError;
pub use events::EventPublisher;
pub use gateway::{GatewayClient, GatewayError, GatewayPayment};
pub use reconcile::{Reconciler, Reconciliation};
pub use store::{MemoryOrderStore, NotificationSource, OrderRepository, PgOrderStore, StoreError};
