//! HTTP gateway routes driven with `tower::ServiceExt::oneshot` against a recording platform.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{test_config, Call, MockConnector, MockPlatform, ScriptedLlm, StaticLlmConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use telegram_bot::{BotConfig, DownstreamError};
use telegram_llm_bot::gateway::SECRET_HEADER;
use telegram_llm_bot::{assemble, router, AppState};
use tower::ServiceExt;

struct Harness {
    state: AppState,
    platform: Arc<MockPlatform>,
    connector: Arc<MockConnector>,
}

impl Harness {
    fn new(config: BotConfig) -> Self {
        let platform = MockPlatform::new();
        let connector = MockConnector::new(platform.clone());
        let state = assemble(
            &config,
            connector.clone(),
            ScriptedLlm::new(&["Hi", " there", "!"]),
            Arc::new(StaticLlmConfig),
        );
        Self {
            state,
            platform,
            connector,
        }
    }

    fn app(&self) -> Router {
        router(self.state.clone())
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Request::post(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_update(&self, body: &str, secret: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::post("/webhook").header("content-type", "application/json");
        if let Some(secret) = secret {
            request = request.header(SECRET_HEADER, secret);
        }
        self.call(request.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

fn text_update(chat_id: i64, text: &str) -> String {
    json!({
        "update_id": 1001,
        "message": {
            "message_id": 77,
            "date": 1700000000,
            "chat": {"id": chat_id, "type": "private", "first_name": "Ann"},
            "from": {"id": chat_id, "is_bot": false, "first_name": "Ann"},
            "text": text
        }
    })
    .to_string()
}

fn without_webhook_url() -> BotConfig {
    let mut config = test_config(false);
    config.base.webhook_url = None;
    config
}

/// **Test: /status reports the lifecycle without connecting.**
#[tokio::test]
async fn test_status_before_and_after_setup() {
    let h = Harness::new(test_config(false));

    let (code, body) = h.get("/status").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "running",
            "environment": "development",
            "webhook_enabled": true,
            "connected": false,
            "state": "uninitialized"
        })
    );

    h.post("/set-webhook").await;
    let (_, body) = h.get("/status").await;
    assert_eq!(body["state"], "ready");
    assert_eq!(body["connected"], true);
}

/// **Test: A webhook call before any session exists is a 500, after JSON validation.**
#[tokio::test]
async fn test_webhook_without_session() {
    let h = Harness::new(test_config(false));

    let (code, body) = h.post_update("{not json", None).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "Invalid JSON"}));

    let (code, body) = h.post_update(&text_update(42, "Hello"), None).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Bot not initialized");
}

/// **Test: JSON that is not a Telegram update is rejected.**
#[tokio::test]
async fn test_webhook_rejects_non_update_json() {
    let h = Harness::new(test_config(false));
    h.post("/set-webhook").await;

    let (code, body) = h.post_update(r#"{"hello": "world"}"#, None).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

/// **Test: In production the secret header must match.**
///
/// **Expected:** Missing or wrong secret is 401 and nothing is processed; the right one is 200.
#[tokio::test]
async fn test_production_requires_secret() {
    let h = Harness::new(test_config(true));
    h.post("/set-webhook").await;

    let (code, body) = h.post_update(&text_update(42, "Hello"), None).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"status": "error", "message": "Unauthorized"}));

    let (code, _) = h.post_update(&text_update(42, "Hello"), Some("wrong")).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    assert_eq!(h.state.dispatcher.active_users(), 0);

    let (code, body) = h.post_update(&text_update(42, "/help"), Some("s3cret")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

/// **Test: In production with no secret configured every webhook call is refused.**
///
/// **Setup:** ENVIRONMENT=production, WEBHOOK_SECRET unset, session ready.
///
/// **Expected:** 401 without the header and 401 with any header value; nothing is queued.
#[tokio::test]
async fn test_production_without_configured_secret_rejects_all() {
    let mut config = test_config(true);
    config.base.webhook_secret = None;
    let h = Harness::new(config);
    h.post("/set-webhook").await;

    let (code, body) = h.post_update(&text_update(42, "Hello"), None).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"status": "error", "message": "Unauthorized"}));

    let (code, _) = h.post_update(&text_update(42, "Hello"), Some("")).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    assert_eq!(h.state.dispatcher.active_users(), 0);
}

/// **Test: Outside production the secret header is not checked.**
#[tokio::test]
async fn test_development_skips_secret_check() {
    let h = Harness::new(test_config(false));
    h.post("/set-webhook").await;

    let (code, _) = h.post_update(&text_update(42, "/help"), Some("wrong")).await;
    assert_eq!(code, StatusCode::OK);
}

/// **Test: A text update is acknowledged and then answered by an edited placeholder.**
///
/// **Setup:** Webhook registered; LLM streams "Hi", " there", "!".
///
/// **Expected:** 200 {"status":"ok"}; the platform sees "Thinking..." then an edit to "Hi there!".
#[tokio::test(start_paused = true)]
async fn test_text_update_is_relayed() {
    let h = Harness::new(test_config(false));
    h.post("/set-webhook").await;

    let (code, body) = h.post_update(&text_update(42, "Hello"), None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    tokio::time::sleep(Duration::from_secs(5)).await;
    let texts: Vec<Call> = h.platform.texts_for_chat(42);
    assert_eq!(
        texts,
        vec![
            Call::Send {
                chat_id: 42,
                text: "Thinking...".to_string()
            },
            Call::Edit {
                chat_id: 42,
                message_id: "1".to_string(),
                text: "Hi there!".to_string()
            }
        ]
    );
}

/// **Test: /set-webhook registers the configured URL, or 400s without one.**
#[tokio::test]
async fn test_set_webhook() {
    let h = Harness::new(test_config(false));
    let (code, body) = h.get("/set-webhook").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "webhook set successfully",
            "webhook_url": "https://example.com/webhook"
        })
    );
    assert!(h
        .platform
        .calls()
        .contains(&Call::SetWebhook("https://example.com/webhook".to_string())));

    let h = Harness::new(without_webhook_url());
    let (code, body) = h.post("/set-webhook").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Webhook URL not configured");
}

/// **Test: A platform failure while registering is a 500 and leaves the bot disconnected.**
#[tokio::test]
async fn test_set_webhook_platform_failure() {
    let h = Harness::new(test_config(false));
    h.platform
        .script(vec![Some(DownstreamError::Fatal("bad webhook".into()))]);

    let (code, body) = h.post("/set-webhook").await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");

    let (_, status) = h.get("/status").await;
    assert_eq!(status["connected"], false);
}

/// **Test: /remove-webhook deletes the webhook and marks the bot disconnected.**
#[tokio::test]
async fn test_remove_webhook() {
    let h = Harness::new(test_config(false));
    let (code, _) = h.post("/remove-webhook").await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);

    h.post("/set-webhook").await;
    let (code, body) = h.post("/remove-webhook").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"status": "webhook removed"}));
    assert!(h.platform.calls().contains(&Call::DeleteWebhook));

    let (_, status) = h.get("/status").await;
    assert_eq!(status["connected"], false);
}

/// **Test: /webhook/info needs a session and then returns the platform's report.**
#[tokio::test]
async fn test_webhook_info() {
    let h = Harness::new(test_config(false));
    let (code, _) = h.get("/webhook/info").await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);

    h.post("/set-webhook").await;
    let (code, body) = h.get("/webhook/info").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["url"], "https://example.com/webhook");
}

/// **Test: /restart reconnects and re-registers the webhook.**
#[tokio::test]
async fn test_restart() {
    let h = Harness::new(test_config(false));
    h.post("/set-webhook").await;

    let (code, body) = h.post("/restart").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!({"status": "bot restarted in webhook mode"}));
    assert_eq!(
        h.connector
            .connects
            .load(std::sync::atomic::Ordering::SeqCst),
        2
    );
    let (_, status) = h.get("/status").await;
    assert_eq!(status["state"], "ready");
}

/// **Test: /restart without a webhook URL reports failure but keeps the new session.**
#[tokio::test]
async fn test_restart_without_webhook_url() {
    let h = Harness::new(without_webhook_url());

    let (code, body) = h.post("/restart").await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"status": "error", "message": "Failed to set up webhook"})
    );
    let (_, status) = h.get("/status").await;
    assert_eq!(status["state"], "ready");
    assert_eq!(status["connected"], false);
}
