use reqwest::{Client, Response};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::{
    config::TapBankConfig,
    dto::order_dto::PaymentMethod,
    error::{Error, Result},
    models::{order::Order, user::User},
};

const PAYOUT_METHODS_PATH: &str = "/public/api/v1/shop/trade-methods/payout";
const PAYIN_METHODS_PATH: &str = "/public/api/v1/shop/trade-methods";
const SYNC_ORDER_PATH: &str = "/public/api/v1/shop/orders/sync-requisites";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOrderPayload {
    pub amount: i64,
    pub currency: String,
    pub customer: CustomerInfo,
    pub integration: IntegrationInfo,
    pub payment: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub id: String,
    pub phone: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationInfo {
    pub callback_url: String,
    pub callback_method: String,
    pub return_url: String,
}

/// Thin client for the Tap Bank shop API. Every call carries the static
/// provider token; nothing is retried.
#[derive(Clone)]
pub struct TapBankService {
    client: Client,
    base_url: String,
    api_token: String,
    callback_url: String,
    return_url: String,
}

impl TapBankService {
    pub fn new(config: &TapBankConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create Tap Bank HTTP client: {}", e)))?;

        info!("Tap Bank gateway at {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            callback_url: config.callback_url.clone(),
            return_url: config.return_url.clone(),
        })
    }

    pub async fn get_payout_methods(&self) -> Result<JsonValue> {
        self.get(PAYOUT_METHODS_PATH).await
    }

    pub async fn get_payin_methods(&self) -> Result<JsonValue> {
        self.get(PAYIN_METHODS_PATH).await
    }

    pub fn sync_order_payload(
        &self,
        order: &Order,
        customer: &User,
        currency: &str,
        payment: &PaymentMethod,
    ) -> Result<SyncOrderPayload> {
        // The provider takes whole currency units only.
        if !order.amount.fract().is_zero() {
            return Err(Error::BadRequest(
                "Order amount must be a whole number of currency units".to_string(),
            ));
        }
        let amount = order
            .amount
            .to_i64()
            .ok_or_else(|| Error::BadRequest("Order amount is out of range".to_string()))?;

        Ok(SyncOrderPayload {
            amount,
            currency: currency.to_string(),
            customer: CustomerInfo {
                id: customer.id.to_string(),
                phone: customer.phone.clone(),
                name: customer.display_name(),
                email: customer.email.clone(),
            },
            integration: IntegrationInfo {
                callback_url: self.callback_url.clone(),
                callback_method: "post".to_string(),
                return_url: self.return_url.clone(),
            },
            payment: payment.clone(),
        })
    }

    pub async fn sync_order(
        &self,
        order: &Order,
        customer: &User,
        currency: &str,
        payment: &PaymentMethod,
    ) -> Result<JsonValue> {
        let payload = self.sync_order_payload(order, customer, currency, payment)?;
        info!(
            order_id = %order.id,
            amount = payload.amount,
            currency = %payload.currency,
            "Syncing order with Tap Bank"
        );

        let response = self
            .client
            .post(self.url(SYNC_ORDER_PATH))
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await?;
        read_json(response).await
    }

    /// Provider notifications are accepted as-is: no signature check, no
    /// idempotency key, no order reconciliation.
    pub fn receive_callback(&self, payload: JsonValue) -> JsonValue {
        info!(payload = %payload, "Received Tap Bank callback");
        payload
    }

    async fn get(&self, path: &str) -> Result<JsonValue> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        read_json(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn read_json(response: Response) -> Result<JsonValue> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Tap Bank returned an error");
        return Err(Error::Gateway {
            status: Some(status.as_u16()),
            body,
        });
    }

    response.json::<JsonValue>().await.map_err(|e| Error::Gateway {
        status: None,
        body: format!("Unreadable Tap Bank response: {}", e),
    })
}
