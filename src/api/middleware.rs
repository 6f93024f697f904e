use crate::api::AppState;
use crate::utils::error::panic_message;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Instant;

/// Errors a handler wants in the request log line.
#[derive(Debug, Clone, Default)]
pub struct RequestErrors(pub Vec<String>);

/// Logs every request once, after the response is produced.
pub async fn request_logger(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let received_at = Instant::now();
    let sequence = state.request_counter.fetch_add(1, Ordering::Relaxed) + 1;

    let path = request.uri().path().to_string();
    let ip = client_ip(&request);
    let headers = request.headers();
    let user_agent = header_str(headers, header::USER_AGENT.as_str()).to_string();
    let referer = header_str(headers, header::REFERER.as_str()).to_string();

    let response = next.run(request).await;

    let errors = response
        .extensions()
        .get::<RequestErrors>()
        .map(|e| e.0.clone())
        .unwrap_or_default();

    tracing::info!(
        seq = sequence,
        path = %path,
        status = response.status().as_u16(),
        ip = %ip,
        ua = %user_agent,
        referer = %referer,
        lapse = ?received_at.elapsed(),
        err = ?errors,
        "request"
    );

    response
}

/// 500 for a handler panic, with the panic text kept for the request log.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(&*panic);
    tracing::error!(panic = %message, "panic while handling request");

    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response();
    response
        .extensions_mut()
        .insert(RequestErrors(vec![format!("panic: {}", message)]));
    response
}

/// First `X-Forwarded-For` hop, then `X-Real-Ip`, then the peer address.
pub fn client_ip(request: &Request) -> String {
    let headers = request.headers();
    let forwarded = header_str(headers, "x-forwarded-for")
        .split(',')
        .next()
        .map(str::trim)
        .unwrap_or_default();
    if !forwarded.is_empty() {
        return forwarded.to_string();
    }

    let real_ip = header_str(headers, "x-real-ip").trim();
    if !real_ip.is_empty() {
        return real_ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
