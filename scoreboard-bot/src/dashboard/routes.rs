//! Dashboard HTTP routes

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use chrono::Utc;
use scoreboard_ledger::{LeaderboardSnapshot, LedgerError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::render::{render_error_page, render_leaderboard};
use super::SharedState;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Leaderboard unavailable: {0}")]
    Ledger(#[from] LedgerError),
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        error!(error = %self, "Leaderboard request failed");
        let body = Json(json!({
            "error": "LEADERBOARD_UNAVAILABLE",
            "message": "Leaderboard is temporarily unavailable",
        }));
        (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
    }
}

async fn load_snapshot(state: &SharedState) -> Result<LeaderboardSnapshot, DashboardError> {
    let leaderboard = state.leaderboard.clone();
    let snapshot = tokio::task::spawn_blocking(move || leaderboard.full())
        .await
        .map_err(|e| LedgerError::Internal(format!("Leaderboard task failed: {}", e)))??;
    Ok(snapshot)
}

/// GET / - rendered leaderboard
pub async fn index(State(state): State<SharedState>) -> Response {
    match load_snapshot(&state).await {
        Ok(snapshot) => {
            Html(render_leaderboard(&snapshot, &state.policy, Utc::now())).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to render leaderboard page");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(render_error_page())).into_response()
        }
    }
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub marker: String,
    pub points_per_report: u32,
    #[serde(flatten)]
    pub snapshot: LeaderboardSnapshot,
}

/// GET /api/leaderboard
pub async fn api_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, DashboardError> {
    let snapshot = load_snapshot(&state).await?;

    Ok(Json(LeaderboardResponse {
        marker: state.policy.marker.clone(),
        points_per_report: state.policy.award,
        snapshot,
    }))
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}
