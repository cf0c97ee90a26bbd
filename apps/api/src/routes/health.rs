use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::error;

use crate::matching::scorer::round2;
use crate::state::AppState;

/// GET /health
/// Pings the database with `SELECT 1` and reports the round trip in milliseconds.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let started = Instant::now();
    let ping = sqlx::query("SELECT 1").execute(&state.db).await;
    let response_time = round2(started.elapsed().as_secs_f64() * 1000.0);

    match ping {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected",
                "response_time": response_time
            })),
        ),
        Err(e) => {
            error!("Health check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "response_time": response_time
                })),
            )
        }
    }
}

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Resume Web Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
