use crate::domain::masking::mask_card_number;
use crate::domain::payment::ProcessPaymentRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card details as the acquirer expects them. Lives only for the duration of
/// a request; persistence only ever sees the masked number.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Card {
    pub name: String,
    pub surname: String,
    pub postcode: String,
    pub card_type: String,
    pub card_num: String,
    pub expiry: String,
    pub cvv: i32,
}

impl Card {
    pub fn from_request(req: &ProcessPaymentRequest) -> Self {
        Self {
            name: req.billing_details.name.clone(),
            surname: req.billing_details.surname.clone(),
            postcode: req.billing_details.postcode.clone(),
            card_type: req.card_type.as_str().to_string(),
            card_num: req.card_number.clone(),
            expiry: req.expiry.clone(),
            cvv: req.cvv,
        }
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .field("postcode", &self.postcode)
            .field("card_type", &self.card_type)
            .field("card_num", &mask_card_number(&self.card_num, 'X'))
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
    #[serde(rename = "RefID")]
    pub ref_id: String,
    pub card: Card,
    pub amount: Decimal,
    pub currency: String,
}

impl Transaction {
    pub fn new(ref_id: &str, req: &ProcessPaymentRequest) -> Self {
        Self {
            ref_id: ref_id.to_string(),
            card: Card::from_request(req),
            amount: req.amount,
            currency: req.currency.clone(),
        }
    }
}
