//! Route handlers. Every response body is JSON.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use telegram_bot::{parse_update, SessionError};
use tracing::{debug, error, info, warn};

use super::{AppState, GatewayError, SECRET_HEADER};

type ApiResult = Result<Json<Value>, GatewayError>;

/// `POST /webhook`: verifies the secret, parses the update, and queues the message. Replies before
/// the message is processed so Telegram does not redeliver slow updates.
pub(super) async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult {
    if state.settings.production {
        let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if !secret_matches(presented, state.settings.webhook_secret.as_deref()) {
            warn!(header_present = presented.is_some(), "Unauthorized webhook attempt");
            return Err(GatewayError::unauthorized());
        }
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "Invalid JSON in webhook request");
        GatewayError::bad_request("Invalid JSON")
    })?;

    if state.sessions.current().await.is_none() {
        error!("Webhook received but no bot session is available");
        return Err(GatewayError::internal(SessionError::NotInitialized.to_string()));
    }

    let message = parse_update(payload).map_err(|e| {
        warn!(error = %e, "Webhook payload is not a Telegram update");
        GatewayError::bad_request("Invalid update payload")
    })?;

    match message {
        Some(message) => state.dispatcher.dispatch(message),
        None => debug!("Ignoring non-message update"),
    }
    Ok(Json(json!({ "status": "ok" })))
}

/// Both sides must be present and equal; an unconfigured secret admits nothing.
fn secret_matches(presented: Option<&str>, expected: Option<&str>) -> bool {
    matches!((presented, expected), (Some(p), Some(e)) if p == e)
}

/// `GET /status`: never waits on lifecycle transitions.
pub(super) async fn status(State(state): State<AppState>) -> Json<Value> {
    let status = state.sessions.status().await;
    Json(json!({
        "status": "running",
        "environment": state.settings.environment,
        "webhook_enabled": true,
        "connected": status.connected,
        "state": status.state,
    }))
}

/// `GET|POST /set-webhook`
pub(super) async fn set_webhook(State(state): State<AppState>) -> ApiResult {
    let Some(url) = state.sessions.webhook_settings().url.clone() else {
        return Err(SessionError::WebhookUrlMissing.into());
    };
    state.sessions.register_webhook().await.map_err(|e| {
        error!(error = %e, "Error setting webhook");
        GatewayError::from(e)
    })?;
    Ok(Json(json!({
        "status": "webhook set successfully",
        "webhook_url": url,
    })))
}

/// `POST /remove-webhook`
pub(super) async fn remove_webhook(State(state): State<AppState>) -> ApiResult {
    state.sessions.remove_webhook().await.map_err(|e| {
        error!(error = %e, "Error removing webhook");
        GatewayError::from(e)
    })?;
    Ok(Json(json!({ "status": "webhook removed" })))
}

/// `GET /webhook/info`: webhook state as reported by Telegram.
pub(super) async fn webhook_info(State(state): State<AppState>) -> ApiResult {
    let info = state.sessions.webhook_info().await.map_err(|e| {
        error!(error = %e, "Error getting webhook info");
        GatewayError::from(e)
    })?;
    Ok(Json(info))
}

/// `POST /restart`: fresh session and webhook registration.
pub(super) async fn restart(State(state): State<AppState>) -> ApiResult {
    info!("Restart requested");
    match state.sessions.restart().await {
        Ok(()) => Ok(Json(json!({ "status": "bot restarted in webhook mode" }))),
        Err(e @ (SessionError::WebhookUrlMissing | SessionError::Platform(_))) => {
            error!(error = %e, "Restart could not register the webhook");
            Err(GatewayError::internal("Failed to set up webhook"))
        }
        Err(e) => {
            error!(error = %e, "Error restarting bot");
            Err(GatewayError::from(e))
        }
    }
}
