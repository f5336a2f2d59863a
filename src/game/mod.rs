use crate::state::AppState;
use axum::Router;

mod detect;
mod dto;
pub mod handlers;
mod launch;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    handlers::game_routes()
}
