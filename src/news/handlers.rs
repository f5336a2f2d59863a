use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateArticleRequest, NewsQuery, UpdateArticleRequest};
use super::repo_types::{NewArticle, NewsArticle};
use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    state::AppState,
    validation::{ValidJson, ValidPath, ValidQuery},
};

const DEFAULT_SOURCE: &str = "Community";

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_news).post(create_news))
        .route(
            "/news/:id",
            get(get_news).patch(update_news).delete(delete_news),
        )
}

#[instrument(skip(state))]
pub async fn list_news(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<NewsQuery>,
) -> Result<Json<Vec<NewsArticle>>, ApiError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    Ok(Json(state.store.list_news(category).await?))
}

#[instrument(skip(state))]
pub async fn get_news(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<NewsArticle>, ApiError> {
    state
        .store
        .get_news(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Article"))
}

#[instrument(skip(state, payload))]
pub async fn create_news(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<CreateArticleRequest>,
) -> Result<(StatusCode, HeaderMap, Json<NewsArticle>), ApiError> {
    let author = match payload.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => a.to_string(),
        None => state
            .store
            .find_user_by_id(user_id)
            .await?
            .map(|u| u.username)
            .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?,
    };
    let source = payload
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SOURCE)
        .to_string();

    let article = state
        .store
        .create_news(NewArticle {
            title: payload.title.trim().to_string(),
            summary: payload.summary.trim().to_string(),
            content: payload.content,
            category: payload.category.trim().to_lowercase(),
            source,
            author,
            is_hot: payload.is_hot,
        })
        .await?;

    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("/api/news/{}", article.id).parse() {
        headers.insert(axum::http::header::LOCATION, value);
    }

    info!(%user_id, article_id = %article.id, "article created");
    Ok((StatusCode::CREATED, headers, Json(article)))
}

/// Articles have no owner: any signed-in user may edit them.
#[instrument(skip(state, payload))]
pub async fn update_news(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateArticleRequest>,
) -> Result<Json<NewsArticle>, ApiError> {
    let article = state
        .store
        .update_news(id, payload.into())
        .await?
        .ok_or(ApiError::NotFound("Article"))?;
    info!(%user_id, article_id = %id, "article updated");
    Ok(Json(article))
}

#[instrument(skip(state))]
pub async fn delete_news(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_news(id).await? {
        return Err(ApiError::NotFound("Article"));
    }
    info!(%user_id, article_id = %id, "article deleted");
    Ok(StatusCode::NO_CONTENT)
}
