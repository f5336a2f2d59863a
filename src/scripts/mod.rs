use crate::state::AppState;
use axum::Router;

mod dto;
mod generate;
pub mod handlers;
pub mod repo_types;
mod templates;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
