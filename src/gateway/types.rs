use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::domain::payment_status::GatewayStatus;
use crate::domain::value_objects::PaymentMethod;

/// A payment as returned by `GET /v1/payments/{id}`. Only the fields the
/// reconciliation and status endpoint need are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub payment_type_id: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<Decimal>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub point_of_interaction: Option<PointOfInteraction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PointOfInteraction {
    #[serde(default)]
    pub transaction_data: Option<TransactionData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionData {
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub qr_code_base64: Option<String>,
    #[serde(default)]
    pub ticket_url: Option<String>,
}

impl GatewayPayment {
    pub fn gateway_status(&self) -> GatewayStatus { GatewayStatus::parse(&self.status) }

    pub fn payment_method(&self) -> PaymentMethod {
        PaymentMethod::from_gateway(self.payment_method_id.as_deref(), self.payment_type_id.as_deref())
    }

    /// QR code and redirect data, only present for pix payments.
    pub fn pix_data(&self) -> Option<&TransactionData> {
        if self.payment_method() != PaymentMethod::Pix { return None; }
        self.point_of_interaction.as_ref()?.transaction_data.as_ref()
    }
}

/// Accepts identifiers sent either as JSON strings or JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw { Str(String), Num(u64) }

    match Raw::deserialize(deserializer)? {
        Raw::Str(s) => Ok(s),
        Raw::Num(n) => Ok(n.to_string()),
    }
}
