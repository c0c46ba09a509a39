//! HTTP surface: liveness probe, the secret-path webhook endpoint, and the
//! webhook (de)registration proxies.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, warn};

use crate::config::Config;
use crate::handler;
use crate::telegram::TelegramClient;
use crate::update::Update;

const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<TelegramClient>,
}

pub fn router(state: AppState) -> Router {
    let secret = &state.config.secret;
    Router::new()
        .route("/", get(index))
        .route(&format!("/{secret}"), post(webhook))
        .route(&format!("/{secret}/set-webhook"), get(set_webhook))
        .route(&format!("/{secret}/delete-webhook"), get(delete_webhook))
        .route(&format!("/{secret}/webhook-info"), get(webhook_info))
        .with_state(state)
}

pub async fn run(state: AppState) -> Result<()> {
    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Listening on {addr}");
    axum::serve(listener, router(state))
        .await
        .context("Server error")
}

async fn index() -> &'static str {
    "OK - Slot Winner Bot is alive!"
}

/// One update in, `{"ok":true}` out. A non-success response would make
/// Telegram re-deliver the update, so only the secret mismatch gets a 403;
/// everything else, including unparseable bodies, is acknowledged.
async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(header) = headers.get(SECRET_TOKEN_HEADER) {
        if header.as_bytes() != state.config.secret.as_bytes() {
            return (StatusCode::FORBIDDEN, "forbidden").into_response();
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(err) => {
            warn!(error = %err, "unparseable update body, acknowledging anyway");
            Update::default()
        }
    };

    handler::handle_update(&state.config, state.client.as_ref(), &update).await;
    Json(json!({ "ok": true })).into_response()
}

async fn set_webhook(State(state): State<AppState>) -> Response {
    let Some(base) = state.config.public_url.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "description": "PUBLIC_URL is not configured" })),
        )
            .into_response();
    };
    let url = format!("{base}/{}", state.config.secret);
    relay(state.client.set_webhook(&url, &state.config.secret).await)
}

async fn delete_webhook(State(state): State<AppState>) -> Response {
    relay(state.client.delete_webhook().await)
}

async fn webhook_info(State(state): State<AppState>) -> Response {
    relay(state.client.webhook_info().await)
}

/// Pass the upstream JSON through verbatim; a transport failure becomes a
/// 502 with the error text (these routes are operator-facing, not
/// Telegram-facing, so a non-2xx is fine here).
fn relay(result: anyhow::Result<serde_json::Value>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "ok": false, "description": err.to_string() })),
        )
            .into_response(),
    }
}
