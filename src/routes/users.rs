use axum::{extract::State, Extension, Json};
use uuid::Uuid;

use crate::{
    dto::auth_dto::{SetSuperuserRequest, UserView},
    error::Result,
    extractors::{AppJson, AppPath},
    models::user::User,
    AppState,
};

pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(user.into())
}

pub async fn set_superuser(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<SetSuperuserRequest>,
) -> Result<Json<UserView>> {
    let user = state
        .account_service
        .set_superuser(&actor, id, payload.is_superuser)
        .await?;
    Ok(Json(user.into()))
}
