pub mod handlers;
pub mod middleware;
pub mod server;

use crate::adapters::qr::{QrDecoder, QrEncoder};
use crate::config::AppConfig;
use crate::domain::ports::{Decoder, Encoder};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;

/// Upper bound on handling one request, body read included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub encoder: Arc<dyn Encoder>,
    pub decoder: Arc<dyn Decoder>,
    /// Log sequence numbers. Only uniqueness matters.
    pub request_counter: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: AppConfig, encoder: Arc<dyn Encoder>, decoder: Arc<dyn Decoder>) -> Self {
        Self {
            config: Arc::new(config),
            encoder,
            decoder,
            request_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// State wired to the real QR libraries.
    pub fn with_qr_libraries(config: AppConfig) -> Self {
        Self::new(config, Arc::new(QrEncoder), Arc::new(QrDecoder))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/encode", get(handlers::encode))
        .route("/decode", post(handlers::decode))
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_logger,
        ))
        .with_state(state)
}
