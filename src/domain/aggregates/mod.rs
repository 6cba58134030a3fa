//! Aggregates module
pub mod order;

pub use order::{Order, OrderError, OrderRecord, OrderStatus, PaymentTransition, StatusChange};
