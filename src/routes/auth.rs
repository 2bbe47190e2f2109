use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    dto::auth_dto::{AuthorizationForm, RefreshRequest, RegisterRequest, UserView},
    error::Result,
    extractors::{AppForm, AppJson},
    services::token_service::TokenPair,
    AppState,
};

#[axum::debug_handler]
pub async fn registration(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<UserView>> {
    payload.validate()?;
    let user = state.account_service.register(payload).await?;
    Ok(Json(user.into()))
}

#[axum::debug_handler]
pub async fn authorization(
    State(state): State<AppState>,
    AppForm(credentials): AppForm<AuthorizationForm>,
) -> Result<Json<TokenPair>> {
    let tokens = state
        .account_service
        .authenticate(&credentials.username, &credentials.password)
        .await?;
    Ok(Json(tokens))
}

pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let tokens = state.account_service.refresh(&payload.refresh_token).await?;
    Ok(Json(tokens))
}
