use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::detect::{self, DetectedClient};
use super::dto::{CreateAccountRequest, LaunchRequest, LaunchResponse};
use super::launch::spawn_detached;
use super::repo_types::{GameAccount, NewGameAccount};
use crate::{
    auth::{extractors::AuthUser, policy::can_modify},
    error::ApiError,
    state::AppState,
    validation::{ValidJson, ValidPath},
};

pub fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/game/accounts", get(list_accounts).post(create_account))
        .route("/game/accounts/:id", delete(delete_account))
        .route("/game/clients/detect", get(detect_clients))
        .route("/game/launch", post(launch))
}

#[instrument(skip(state))]
pub async fn list_accounts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<GameAccount>>, ApiError> {
    Ok(Json(state.store.list_game_accounts(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<GameAccount>), ApiError> {
    let account = state
        .store
        .create_game_account(NewGameAccount {
            user_id,
            username: payload.username.trim().to_string(),
            game: payload.game.trim().to_lowercase(),
        })
        .await?;
    info!(%user_id, account_id = %account.id, "game account linked");
    Ok((StatusCode::CREATED, Json(account)))
}

async fn owned_account(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<GameAccount, ApiError> {
    let account = state
        .store
        .get_game_account(id)
        .await?
        .ok_or(ApiError::NotFound("Game account"))?;
    if !can_modify(Some(account.user_id), user_id) {
        warn!(%user_id, account_id = %id, "game account belongs to another user");
        return Err(ApiError::Forbidden(
            "You can only use your own game accounts".into(),
        ));
    }
    Ok(account)
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    owned_account(&state, user_id, id).await?;
    if !state.store.delete_game_account(id).await? {
        return Err(ApiError::NotFound("Game account"));
    }
    info!(%user_id, account_id = %id, "game account removed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument]
pub async fn detect_clients() -> Result<Json<Vec<DetectedClient>>, ApiError> {
    let clients = tokio::task::spawn_blocking(detect::detect_all)
        .await
        .context("client detection task")?;
    Ok(Json(clients))
}

#[instrument(skip(state, payload))]
pub async fn launch(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<LaunchRequest>,
) -> Result<Json<LaunchResponse>, ApiError> {
    let account = owned_account(&state, user_id, payload.account_id).await?;

    let client = detect::known(&payload.client_id).ok_or(ApiError::NotFound("Game client"))?;
    let detected = tokio::task::spawn_blocking(move || detect::detect(client))
        .await
        .context("client detection task")?;
    let path = detected.path.ok_or(ApiError::NotFound("Game client"))?;

    let pid = spawn_detached(std::path::Path::new(&path))?;
    info!(%user_id, account_id = %account.id, client = client.id, ?pid, "game client launched");

    Ok(Json(LaunchResponse {
        success: true,
        client_id: client.id.to_string(),
        account_id: account.id,
        pid,
    }))
}
