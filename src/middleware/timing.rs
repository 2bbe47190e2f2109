use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub static X_PROCESS_TIME: HeaderName = HeaderName::from_static("x-process-time");

/// Adds `X-Process-Time` (seconds) to every response.
pub async fn process_time(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();
    if let Ok(value) = HeaderValue::from_str(&elapsed.to_string()) {
        response.headers_mut().insert(X_PROCESS_TIME.clone(), value);
    }
    response
}
