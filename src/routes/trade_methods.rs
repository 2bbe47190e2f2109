use axum::{extract::State, Extension, Json};
use serde_json::Value as JsonValue;

use crate::{error::Result, models::user::User, AppState};

pub async fn payout(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
) -> Result<Json<JsonValue>> {
    Ok(Json(state.tap_bank_service.get_payout_methods().await?))
}

pub async fn payin(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
) -> Result<Json<JsonValue>> {
    Ok(Json(state.tap_bank_service.get_payin_methods().await?))
}
