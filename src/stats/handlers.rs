use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, instrument};

use super::dto::{HistoryQuery, RecordStatsRequest};
use super::repo_types::SystemStatsSnapshot;
use super::simulate;
use crate::{
    error::ApiError,
    state::AppState,
    validation::{ValidJson, ValidQuery},
};

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/system-stats", get(current_stats))
        .route("/system-stats/history", get(stats_history))
        .route("/stats", post(record_stats))
        .route("/stats/current", get(current_stats))
        .route("/stats/history", get(stats_history))
}

#[instrument(skip(state))]
pub async fn current_stats(
    State(state): State<AppState>,
) -> Result<Json<SystemStatsSnapshot>, ApiError> {
    match state.store.latest_stats().await? {
        Some(snapshot) => Ok(Json(snapshot)),
        None => {
            debug!("no stats recorded; returning simulated sample");
            Ok(Json(simulate::sample()))
        }
    }
}

#[instrument(skip(state))]
pub async fn stats_history(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<HistoryQuery>,
) -> Result<Json<Vec<SystemStatsSnapshot>>, ApiError> {
    Ok(Json(state.store.stats_history(query.limit()).await?))
}

#[instrument(skip(state, payload))]
pub async fn record_stats(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RecordStatsRequest>,
) -> Result<(StatusCode, Json<SystemStatsSnapshot>), ApiError> {
    let snapshot = state.store.record_stats(payload.into()).await?;
    debug!(id = %snapshot.id, "stats recorded");
    Ok((StatusCode::CREATED, Json(snapshot)))
}
