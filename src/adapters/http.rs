//! HTTP adapter — the watering endpoints consumed by the dashboard.
//!
//! | Route                    | Method | Handler  |
//! |--------------------------|--------|----------|
//! | `/api/water/status`      | GET    | status   |
//! | `/api/water/toggle`      | POST   | toggle   |
//! | `/api/water/history`     | GET    | history  |
//!
//! Hardware failures never surface as transport errors: the toggle replies
//! 200 with `success: false`.  Only a malformed request body or query, or a
//! failing history lookup, produce a 500.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::app::commands::WaterCommand;
use crate::app::controller::WateringController;
use crate::app::events::WateringRecord;
use crate::app::ports::WateringHistory;
use crate::drivers::relay::LineDriver;

// ── Shared state ──────────────────────────────────────────────

pub struct ApiState<D: LineDriver> {
    pub controller: Arc<WateringController<D>>,
    pub history: Arc<dyn WateringHistory>,
    pub history_limit: usize,
}

impl<D: LineDriver> Clone for ApiState<D> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            history: Arc::clone(&self.history),
            history_limit: self.history_limit,
        }
    }
}

pub fn router<D>(state: ApiState<D>) -> Router
where
    D: LineDriver + Send + 'static,
    D::Pin: Send + 'static,
{
    Router::new()
        .route("/api/water/status", get(status::<D>))
        .route("/api/water/toggle", post(toggle::<D>))
        .route("/api/water/history", get(history::<D>))
        .with_state(state)
}

// ── Wire types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub state: bool,
    #[serde(default)]
    pub triggered_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WaterStatus {
    pub success: bool,
    pub is_watering: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryReply {
    pub success: bool,
    pub data: Vec<WateringRecord>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorReply {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

fn server_error(message: impl Into<String>) -> Response {
    let body = ErrorReply {
        success: false,
        error: message.into(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

// ── Handlers ──────────────────────────────────────────────────

async fn status<D>(State(state): State<ApiState<D>>) -> Json<WaterStatus>
where
    D: LineDriver + Send + 'static,
    D::Pin: Send + 'static,
{
    Json(WaterStatus {
        success: true,
        is_watering: state.controller.status(),
        error: None,
    })
}

async fn toggle<D>(State(state): State<ApiState<D>>, body: Bytes) -> Response
where
    D: LineDriver + Send + 'static,
    D::Pin: Send + 'static,
{
    let request: ToggleRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("http: malformed toggle body: {e}");
            return server_error(e.to_string());
        }
    };

    let wanted = request.state;
    let command = WaterCommand::set(wanted, request.triggered_by);
    let controller = Arc::clone(&state.controller);
    // The relay write and the event sink both block; keep them off the
    // async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        let ok = controller.handle_command(command);
        (ok, controller.status())
    })
    .await;
    let (ok, is_watering) = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("http: toggle task failed: {e}");
            return server_error("toggle task failed");
        }
    };
    let reply = WaterStatus {
        success: ok,
        is_watering,
        error: (!ok).then(|| {
            let verb = if wanted { "start" } else { "stop" };
            format!("failed to {verb} watering")
        }),
    };
    Json(reply).into_response()
}

async fn history<D>(
    State(state): State<ApiState<D>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Response
where
    D: LineDriver + Send + 'static,
    D::Pin: Send + 'static,
{
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => {
            warn!("http: malformed history query: {e}");
            return server_error(e.body_text());
        }
    };
    let result = match (query.start, query.end) {
        (Some(start), Some(end)) => state.history.in_range(start, end),
        _ => state
            .history
            .recent(query.limit.unwrap_or(state.history_limit)),
    };
    match result {
        Ok(data) => Json(HistoryReply {
            success: true,
            data,
        })
        .into_response(),
        Err(e) => {
            error!("http: fetching watering history failed: {e}");
            server_error("Failed to fetch watering history")
        }
    }
}
