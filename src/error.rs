use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value as JsonValue};

pub type Result<T> = std::result::Result<T, Error>;

const INTERNAL_DETAIL: &str = "Internal Server Error";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token is not valid")]
    InvalidToken,

    #[error("Token is expired")]
    ExpiredToken,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Username is already exist")]
    UsernameTaken,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("User balance < order amount")]
    InsufficientBalance,

    #[error("You cannot change superuser status for yourself.")]
    SelfModificationForbidden,

    /// The payment provider answered with a non-success status (`status` is set)
    /// or could not be reached at all (`status` is `None`).
    #[error("Payment gateway error ({status:?}): {body}")]
    Gateway {
        status: Option<u16>,
        body: String,
    },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_)
            | Error::Validation(_)
            | Error::Json(_)
            | Error::InsufficientBalance => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_)
            | Error::InvalidToken
            | Error::ExpiredToken
            | Error::UsernameTaken
            | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden | Error::SelfModificationForbidden => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Gateway { status: Some(code), .. } => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::Gateway { status: None, .. } => StatusCode::BAD_GATEWAY,
            Error::Config(_)
            | Error::Database(_)
            | Error::Jwt(_)
            | Error::PasswordHash(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> JsonValue {
        match self {
            Error::BadRequest(msg) | Error::Unauthorized(msg) | Error::NotFound(msg) => {
                JsonValue::String(msg.clone())
            }
            Error::Validation(err) => JsonValue::String(err.to_string()),
            Error::Json(err) => JsonValue::String(err.to_string()),
            Error::Gateway { status: Some(_), body } => serde_json::from_str(body)
                .unwrap_or_else(|_| JsonValue::String(body.clone())),
            Error::Gateway { status: None, .. } => {
                JsonValue::String("Payment gateway is unavailable".to_string())
            }
            Error::Config(_)
            | Error::Database(_)
            | Error::Jwt(_)
            | Error::PasswordHash(_)
            | Error::Internal(_) => JsonValue::String(INTERNAL_DETAIL.to_string()),
            other => JsonValue::String(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "detail": self.detail() }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Gateway {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for Error {
    fn from(rejection: FormRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Error::PasswordHash(err.to_string())
    }
}

/// Postgres SQLSTATE of a failed statement, if the failure came from the server.
pub fn pg_error_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

pub const PG_UNIQUE_VIOLATION: &str = "23505";
pub const PG_CHECK_VIOLATION: &str = "23514";

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: Error) -> (StatusCode, JsonValue) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn domain_errors_map_to_documented_statuses() {
        let (status, body) = render(Error::UsernameTaken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Username is already exist");

        let (status, body) = render(Error::InsufficientBalance).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "User balance < order amount");

        assert_eq!(Error::SelfModificationForbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::NotFound("User".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (status, body) = render(Error::Internal("connection refused to 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], INTERNAL_DETAIL);
    }

    #[tokio::test]
    async fn gateway_errors_pass_provider_answer_through() {
        let (status, body) = render(Error::Gateway {
            status: Some(422),
            body: r#"{"message":"bank not supported"}"#.into(),
        })
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"]["message"], "bank not supported");

        let (status, _) = render(Error::Gateway {
            status: None,
            body: "operation timed out".into(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
