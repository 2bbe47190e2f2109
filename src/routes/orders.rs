use axum::{extract::State, Extension, Json};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::{
    dto::order_dto::OrderRequest, error::Result, extractors::AppJson, models::order::Order,
    models::user::User, AppState,
};

/// Responds with the provider's answer verbatim.
#[axum::debug_handler]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppJson(payload): AppJson<OrderRequest>,
) -> Result<Json<JsonValue>> {
    payload.validate()?;
    let created = state.order_service.create_order(&user, &payload).await?;
    Ok(Json(created.gateway_response))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.order_service.list_orders(user.id).await?))
}

pub async fn order_callback(
    State(state): State<AppState>,
    AppJson(payload): AppJson<JsonValue>,
) -> Json<JsonValue> {
    Json(state.tap_bank_service.receive_callback(payload))
}
