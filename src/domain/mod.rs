//! Payment domain: orders, money, gateway statuses and events.
pub mod aggregates;
pub mod events;
pub mod payment_status;
pub mod value_objects;
