use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Stamp every response with its handling time, e.g. `X-Response-Time: 3.142ms`.
pub async fn response_time(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{:.3}ms", elapsed_ms)) {
        response.headers_mut().insert(X_RESPONSE_TIME, value);
    }
    response
}
