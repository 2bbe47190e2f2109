use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub kind: String,
    #[validate(length(min = 1, max = 64))]
    pub bank: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, max = 16))]
    pub currency: String,
    #[validate(nested)]
    pub payment: PaymentMethod,
}
