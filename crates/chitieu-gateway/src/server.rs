//! Webhook HTTP server
//!
//! Routes:
//! - `GET /` and `GET /health` — static ok payload for platform health checks
//! - `POST /telegram/webhook/{secret}` — Telegram update delivery; the path
//!   segment must match the configured secret or the route 404s
//!
//! Every accepted update is acknowledged with `{"ok":true}` whether or not
//! it contained a message; Telegram retries anything else. Replies go out
//! fire-and-forget so delivery problems never delay the acknowledgment.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chitieu_core::{Bot, Dispatch};
use chitieu_telegram::{decode_update, TelegramClient};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state for the webhook handlers
#[derive(Clone)]
pub struct GatewayState {
    pub bot: Arc<Bot>,
    pub telegram: Arc<TelegramClient>,
    pub webhook_secret: String,
}

/// The webhook server
pub struct WebhookServer {
    state: GatewayState,
    bind: SocketAddr,
}

impl WebhookServer {
    pub fn new(bind: SocketAddr, state: GatewayState) -> Self {
        Self { state, bind }
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(health_handler))
            .route("/health", get(health_handler))
            .route("/telegram/webhook/{secret}", post(webhook_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the server (blocks until shutdown)
    pub async fn run(self) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind).await?;
        info!("Webhook server listening on {}", self.bind);
        axum::serve(listener, router).await?;
        Ok(())
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn webhook_handler(
    State(state): State<GatewayState>,
    Path(secret): Path<String>,
    Json(update): Json<Value>,
) -> impl IntoResponse {
    if secret != state.webhook_secret {
        return StatusCode::NOT_FOUND.into_response();
    }

    // updates without a message (service events, channel posts) are
    // acknowledged and dropped
    let Some(msg) = decode_update(&update) else {
        return Json(json!({ "ok": true })).into_response();
    };

    match state.bot.handle(&msg).await {
        Ok(Dispatch::Reply(text)) => {
            let telegram = state.telegram.clone();
            let chat_id = msg.chat_id.clone();
            tokio::spawn(async move {
                telegram.notify(&chat_id, &text).await;
            });
            Json(json!({ "ok": true })).into_response()
        }
        Ok(Dispatch::Forbidden) => StatusCode::FORBIDDEN.into_response(),
        Err(e) => {
            error!("Dispatch failed for chat {}: {:#}", msg.chat_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
