//! Value Objects for payments

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_uppercase() } }
    pub fn brl(amount: Decimal) -> Self { Self::new(amount, "BRL") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
}

impl Default for Money { fn default() -> Self { Self::zero("BRL") } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.amount, self.currency) }
}

#[derive(Debug, Clone)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

/// How the customer chose to pay for an order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    CreditCard,
    DebitCard,
    Boleto,
    #[default]
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "pix",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Boleto => "boleto",
            Self::Other => "other",
        }
    }

    /// Resolves the method from the gateway's `payment_method_id` and
    /// `payment_type_id` pair. The method id wins for pix, the type id for
    /// everything else.
    pub fn from_gateway(method_id: Option<&str>, type_id: Option<&str>) -> Self {
        if method_id.is_some_and(|m| m.eq_ignore_ascii_case("pix")) { return Self::Pix; }
        match type_id.map(str::to_ascii_lowercase).as_deref() {
            Some("credit_card") => Self::CreditCard,
            Some("debit_card") => Self::DebitCard,
            Some("ticket") => Self::Boleto,
            Some("bank_transfer") if method_id.is_none() => Self::Pix,
            _ => Self::Other,
        }
    }

    /// Parses the stored column value; anything unknown is `Other`.
    pub fn from_db(value: &str) -> Self {
        match value {
            "pix" => Self::Pix,
            "credit_card" => Self::CreditCard,
            "debit_card" => Self::DebitCard,
            "boleto" => Self::Boleto,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_add() {
        let a = Money::brl(Decimal::new(10000, 2));
        let b = Money::brl(Decimal::new(1550, 2));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(11550, 2));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let a = Money::brl(Decimal::ONE);
        let b = Money::new(Decimal::ONE, "usd");
        assert_eq!(b.currency(), "USD");
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn test_payment_method_from_gateway() {
        assert_eq!(PaymentMethod::from_gateway(Some("pix"), Some("bank_transfer")), PaymentMethod::Pix);
        assert_eq!(PaymentMethod::from_gateway(Some("visa"), Some("credit_card")), PaymentMethod::CreditCard);
        assert_eq!(PaymentMethod::from_gateway(Some("bolbradesco"), Some("ticket")), PaymentMethod::Boleto);
        assert_eq!(PaymentMethod::from_gateway(None, None), PaymentMethod::Other);
    }

    #[test]
    fn test_payment_method_db_roundtrip() {
        for m in [PaymentMethod::Pix, PaymentMethod::CreditCard, PaymentMethod::DebitCard, PaymentMethod::Boleto, PaymentMethod::Other] {
            assert_eq!(PaymentMethod::from_db(m.as_str()), m);
        }
    }
}
