use crate::domain::masking::mask_card_number;
use crate::domain::status::Status;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    #[default]
    Undefined,
    Card,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Undefined => "UNDEFINED",
            PaymentType::Card => "CARD",
        }
    }

    pub fn parse(s: &str) -> PaymentType {
        match s {
            "CARD" => PaymentType::Card,
            _ => PaymentType::Undefined,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardType {
    #[default]
    Undefined,
    Visa,
    Mastercard,
    Amex,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Undefined => "UNDEFINED",
            CardType::Visa => "VISA",
            CardType::Mastercard => "MASTERCARD",
            CardType::Amex => "AMEX",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_line_1: String,
    #[serde(default)]
    pub address_line_2: String,
    #[serde(default)]
    pub postcode: String,
}

#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessPaymentRequest {
    #[serde(default)]
    pub billing_details: BillingDetails,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvv: i32,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub card_type: CardType,
}

impl ProcessPaymentRequest {
    /// Reports whether every field the bank needs carries a non-zero value.
    pub fn has_required_fields(&self) -> bool {
        !self.amount.is_zero()
            && !self.currency.is_empty()
            && !self.card_number.is_empty()
            && self.cvv != 0
            && !self.expiry.is_empty()
    }
}

// PAN and CVV must not end up in logs.
impl fmt::Debug for ProcessPaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessPaymentRequest")
            .field("billing_details", &self.billing_details)
            .field("card_number", &mask_card_number(&self.card_number, 'X'))
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("payment_type", &self.payment_type)
            .field("card_type", &self.card_type)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessPaymentResponse {
    pub reference: String,
    pub status: Status,
    pub status_reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub reference: String,
    pub billing_details: BillingDetails,
    pub card_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_type: PaymentType,
    pub status: Status,
    pub status_reason: String,
    pub insert_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

pub const NOT_FOUND_REASON: &str = "transaction does not exist";

impl PaymentRecord {
    pub fn not_found() -> Self {
        Self {
            status: Status::Unknown,
            payment_type: PaymentType::Undefined,
            status_reason: NOT_FOUND_REASON.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
