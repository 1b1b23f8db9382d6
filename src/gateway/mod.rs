//! Inbound trigger gateway: network requests become bus triggers.
//!
//! Handlers validate, enqueue and return immediately — a 202 means the
//! trigger was accepted onto the queue, never that the action has run.

use std::net::SocketAddr;
use std::str::FromStr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::bus::{BusError, BusSender};
use crate::state::{DeviceState, StateReader};
use crate::triggers::{Expression, Trigger, TriggerSource};

#[derive(Clone)]
pub struct AppState {
    pub bus: BusSender,
    pub state: StateReader,
}

/// Build the application router with the provided state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/speak", post(speak))
        .route("/help", post(help))
        .route("/expression", post(expression))
        .with_state(state)
}

/// Bind and serve until the token is cancelled.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn status(State(app): State<AppState>) -> Json<DeviceState> {
    Json(app.state.snapshot())
}

#[derive(Debug, Deserialize)]
struct SpeakRequest {
    #[serde(default)]
    text: String,
}

async fn speak(State(app): State<AppState>, Json(req): Json<SpeakRequest>) -> Response {
    let text = req.text.trim();
    if text.is_empty() {
        return rejection("No text provided");
    }

    log::info!("Speak request: '{}'", text);
    enqueue(
        &app,
        Trigger::Speak {
            text: text.to_string(),
        },
    )
}

async fn help(State(app): State<AppState>) -> Response {
    log::info!("Help request received over the network");
    enqueue(
        &app,
        Trigger::HelpRequest {
            source: TriggerSource::Network,
        },
    )
}

#[derive(Debug, Deserialize)]
struct ExpressionRequest {
    #[serde(default)]
    expression: String,
}

async fn expression(State(app): State<AppState>, Json(req): Json<ExpressionRequest>) -> Response {
    let Ok(expression) = Expression::from_str(&req.expression) else {
        return rejection("Unknown expression; expected one of: neutral, concerned, listening, happy");
    };

    log::info!("Expression override: {}", expression);
    enqueue(&app, Trigger::Expression { expression })
}

/// Shared enqueue tail: accepted, busy, or (only during shutdown) gone.
fn enqueue(app: &AppState, trigger: Trigger) -> Response {
    match app.bus.push(trigger) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(json!({"status": "accepted"})),
        )
            .into_response(),
        Err(BusError::Full) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "busy"})),
        )
            .into_response(),
        Err(BusError::Closed) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "error", "message": "executor is gone"})),
        )
            .into_response(),
    }
}

fn rejection(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "error", "message": message})),
    )
        .into_response()
}
