#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use salt_backend::config::{Config, JwtConfig, LogConfig, TapBankConfig};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const PROVIDER_TOKEN: &str = "provider-token";
pub const PAYOUT_PATH: &str = "/public/api/v1/shop/trade-methods/payout";
pub const PAYIN_PATH: &str = "/public/api/v1/shop/trade-methods";
pub const SYNC_PATH: &str = "/public/api/v1/shop/orders/sync-requisites";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<JsonValue>,
}

#[derive(Clone, Default)]
pub struct ProviderState {
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    pub fail_sync: Arc<AtomicBool>,
    pub delay: Arc<Mutex<Duration>>,
}

impl ProviderState {
    fn record(&self, path: &str, headers: &HeaderMap, body: Option<JsonValue>) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            authorization,
            body,
        });
    }

    async fn maybe_stall(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// In-process stand-in for the Tap Bank shop API.
pub struct FakeProvider {
    pub base_url: String,
    pub state: ProviderState,
}

impl FakeProvider {
    pub async fn spawn() -> Self {
        let state = ProviderState::default();
        let app = Router::new()
            .route(PAYOUT_PATH, get(payout))
            .route(PAYIN_PATH, get(payin))
            .route(SYNC_PATH, post(sync_requisites))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn fail_sync(&self, fail: bool) {
        self.state.fail_sync.store(fail, Ordering::SeqCst);
    }

    pub fn stall_for(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Sync bodies sent for one customer id.
    pub fn syncs_for(&self, customer_id: &str) -> Vec<JsonValue> {
        self.requests_to(SYNC_PATH)
            .into_iter()
            .filter_map(|r| r.body)
            .filter(|b| b["customer"]["id"] == customer_id)
            .collect()
    }
}

async fn payout(State(state): State<ProviderState>, headers: HeaderMap) -> Json<JsonValue> {
    state.record(PAYOUT_PATH, &headers, None);
    Json(json!({ "methods": [{ "type": "card", "bank": "sber" }] }))
}

async fn payin(State(state): State<ProviderState>, headers: HeaderMap) -> Json<JsonValue> {
    state.maybe_stall().await;
    state.record(PAYIN_PATH, &headers, None);
    Json(json!({ "methods": [{ "type": "sbp", "bank": "tinkoff" }] }))
}

async fn sync_requisites(
    State(state): State<ProviderState>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Response {
    state.record(SYNC_PATH, &headers, Some(body.clone()));
    if state.fail_sync.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "provider is down" })),
        )
            .into_response();
    }
    Json(json!({
        "status": "created",
        "amount": body["amount"],
        "requisites": { "card": "2200 0000 0000 0000" }
    }))
    .into_response()
}

pub fn fixtures_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn test_config(database_url: &str, provider_base_url: &str) -> Config {
    let fixtures = fixtures_dir();
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: database_url.into(),
        db_max_connections: 10,
        jwt: JwtConfig {
            private_key_path: fixtures.join("jwt_ed25519_private.pem"),
            public_key_path: fixtures.join("jwt_ed25519_public.pem"),
            algorithm: "EdDSA".into(),
            access_token_expire_minutes: 15,
            refresh_token_expire_minutes: 60 * 24,
        },
        tls: None,
        log: LogConfig {
            level: "info".into(),
            json: false,
            path: None,
            name: "salt-backend-test.log".into(),
        },
        tap_bank: TapBankConfig {
            base_url: provider_base_url.into(),
            api_token: PROVIDER_TOKEN.into(),
            timeout: Duration::from_secs(5),
            callback_url: String::new(),
            return_url: "https://your-shop.com".into(),
        },
        cors_origins: vec!["http://localhost:8000".into()],
        bootstrap_superuser: None,
    }
}

/// Database-backed tests run only when `DATABASE_URL` points at a Postgres.
pub fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ => {
            eprintln!("DATABASE_URL is not set, skipping database-backed test");
            None
        }
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, JsonValue) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, headers, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: JsonValue) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}
