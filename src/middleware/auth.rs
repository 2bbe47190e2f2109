use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{Error, Result},
    models::user::User,
    AppState,
};

/// Verifies the bearer token, loads the acting user fresh from the store and
/// puts it into the request extensions for `Extension<User>` handlers.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

/// Must be layered inside `require_auth`.
pub async fn require_superuser(req: Request, next: Next) -> Response {
    let is_superuser = req.extensions().get::<User>().map(|user| user.is_superuser);
    match is_superuser {
        Some(true) => next.run(req).await,
        Some(false) => Error::Forbidden.into_response(),
        None => Error::Unauthorized("Not authenticated".into()).into_response(),
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let token = bearer_token(headers)?;
    let verified = state.account_service.tokens().verify(token)?;
    state
        .account_service
        .get_user(verified.subject_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found.", verified.subject_id)))
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Err(Error::Unauthorized("Not authenticated".into()));
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| Error::Unauthorized("Invalid authorization header".into()))?;
    match auth_str.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(Error::Unauthorized("Invalid authentication credentials".into())),
    }
}
