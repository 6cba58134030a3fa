//! Gateway payment statuses and their mapping onto order statuses.
//!
//! The mapping is a lookup table applied in one direction only. It is a pure
//! function of the latest status reported by the gateway, which is what makes
//! reapplying the same notification harmless.

use crate::domain::aggregates::OrderStatus;
use serde::{Serialize, Serializer};
use std::fmt;

/// Status of a payment as reported by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayStatus {
    Approved,
    Pending,
    InProcess,
    Authorized,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    InMediation,
    Unknown(String),
}

impl GatewayStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "in_process" => Self::InProcess,
            "authorized" => Self::Authorized,
            "rejected" => Self::Rejected,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "charged_back" => Self::ChargedBack,
            "in_mediation" => Self::InMediation,
            _ => Self::Unknown(raw.trim().to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::Authorized => "authorized",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::ChargedBack => "charged_back",
            Self::InMediation => "in_mediation",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Serialize for GatewayStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Order status implied by a gateway status, or `None` when the status carries
/// no meaning for the order and no write should happen.
pub fn map_to_order_status(status: &GatewayStatus) -> Option<OrderStatus> {
    match status {
        GatewayStatus::Approved => Some(OrderStatus::Paid),
        GatewayStatus::Pending | GatewayStatus::InProcess | GatewayStatus::Authorized => Some(OrderStatus::Pending),
        GatewayStatus::Rejected => Some(OrderStatus::Declined),
        GatewayStatus::Cancelled => Some(OrderStatus::Cancelled),
        GatewayStatus::Refunded => Some(OrderStatus::Refunded),
        GatewayStatus::ChargedBack | GatewayStatus::InMediation => Some(OrderStatus::Disputed),
        GatewayStatus::Unknown(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_table() {
        let cases = [
            ("approved", Some(OrderStatus::Paid)),
            ("pending", Some(OrderStatus::Pending)),
            ("rejected", Some(OrderStatus::Declined)),
            ("cancelled", Some(OrderStatus::Cancelled)),
            ("refunded", Some(OrderStatus::Refunded)),
            ("charged_back", Some(OrderStatus::Disputed)),
            ("in_process", Some(OrderStatus::Pending)),
            ("authorized", Some(OrderStatus::Pending)),
            ("in_mediation", Some(OrderStatus::Disputed)),
        ];
        for (raw, expected) in cases {
            assert_eq!(map_to_order_status(&GatewayStatus::parse(raw)), expected, "{raw}");
        }
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        assert_eq!(GatewayStatus::parse("  APPROVED "), GatewayStatus::Approved);
        assert_eq!(GatewayStatus::parse("Charged_Back"), GatewayStatus::ChargedBack);
    }

    #[test]
    fn test_unknown_status_has_no_mapping() {
        let status = GatewayStatus::parse("expired");
        assert_eq!(status, GatewayStatus::Unknown("expired".into()));
        assert_eq!(status.as_str(), "expired");
        assert_eq!(map_to_order_status(&status), None);
    }
}
