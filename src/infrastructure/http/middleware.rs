//! HTTP Middleware
//!
//! 状态码错误与慢请求日志

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::{Duration, Instant};

/// AI 生成通常需要数秒，超过此阈值才记为慢请求
const SLOW_REQUEST: Duration = Duration::from_secs(30);

/// 拦截 HTTP 响应，4xx / 5xx 与慢请求记录日志
///
/// 业务错误（errno != 0）以 HTTP 200 返回，在 `ApiError::into_response()` 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed = started.elapsed();
    let latency_ms = elapsed.as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms,
            "HTTP client error"
        );
    } else if elapsed > SLOW_REQUEST {
        tracing::warn!(method = %method, uri = %uri, latency_ms, "Slow request");
    }

    response
}
