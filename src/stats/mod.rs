use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo_types;
mod simulate;

pub fn router() -> Router<AppState> {
    handlers::stats_routes()
}
