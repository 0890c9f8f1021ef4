//! HTTP gateway: Telegram webhook intake plus status and webhook-management endpoints.

mod error;
mod routes;

use std::any::Any;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use telegram_bot::SessionManager;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::dispatcher::UserDispatcher;

pub use error::GatewayError;

/// Header Telegram uses to echo the webhook secret.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

#[derive(Debug, Clone, Default)]
pub struct GatewaySettings {
    /// ENVIRONMENT, reported by `/status`.
    pub environment: String,
    /// Secret header is enforced only in production.
    pub production: bool,
    pub webhook_secret: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub dispatcher: UserDispatcher,
    pub settings: Arc<GatewaySettings>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(routes::webhook))
        .route("/webhook/info", get(routes::webhook_info))
        .route("/status", get(routes::status))
        .route(
            "/set-webhook",
            get(routes::set_webhook).post(routes::set_webhook),
        )
        .route("/remove-webhook", post(routes::remove_webhook))
        .route("/restart", post(routes::restart))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A panicking handler becomes the usual JSON 500 instead of a dropped connection.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail = %detail, "Request handler panicked");
    GatewayError::internal("Internal server error").into_response()
}
