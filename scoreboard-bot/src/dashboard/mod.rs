//! Dashboard - web leaderboard
//!
//! Provides:
//! - Rendered HTML leaderboard at `/`
//! - JSON snapshot at `/api/leaderboard`
//! - Health check

pub mod render;
pub mod routes;

use std::sync::Arc;

use axum::{routing::get, Router};
use scoreboard_ledger::{Leaderboard, ScoringPolicy};

/// Dashboard state shared across handlers
pub struct DashboardState {
    pub leaderboard: Arc<Leaderboard>,
    pub policy: ScoringPolicy,
}

pub type SharedState = Arc<DashboardState>;

impl DashboardState {
    pub fn new(leaderboard: Arc<Leaderboard>, policy: ScoringPolicy) -> Self {
        Self { leaderboard, policy }
    }
}

/// Create the dashboard router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/leaderboard", get(routes::api_leaderboard))
        .route("/health", get(routes::health))
        .with_state(state)
}
