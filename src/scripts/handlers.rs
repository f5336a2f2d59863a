use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    CreateScriptRequest, ExecuteResponse, FavoriteResponse, GenerateScriptRequest,
    GenerateScriptResponse, ScriptQuery, UpdateScriptRequest,
};
use super::generate::generate;
use super::repo_types::{NewScript, Script};
use super::templates::CATEGORIES;
use crate::{
    auth::{
        extractors::{AuthUser, MaybeAuthUser},
        policy::{can_modify, can_view},
    },
    error::ApiError,
    state::AppState,
    validation::{ValidJson, ValidPath, ValidQuery},
};

const ANONYMOUS_AUTHOR: &str = "AI Generator";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/scripts", get(list_scripts))
        .route("/scripts/:id", get(get_script))
        .route("/categories", get(list_categories))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/scripts", post(create_script))
        .route("/scripts/generate", post(generate_script))
        .route(
            "/scripts/:id",
            axum::routing::patch(update_script).delete(delete_script),
        )
        .route("/scripts/:id/execute", post(execute_script))
        .route("/scripts/:id/favorite", post(toggle_favorite))
}

/// Loads a script the requester is allowed to see; hidden scripts look absent.
async fn visible_script(
    state: &AppState,
    id: Uuid,
    requester: Option<Uuid>,
) -> Result<Script, ApiError> {
    match state.store.get_script(id).await? {
        Some(script) if can_view(&script, requester) => Ok(script),
        _ => Err(ApiError::NotFound("Script")),
    }
}

/// Loads a script and checks the requester owns it.
async fn owned_script(state: &AppState, id: Uuid, user_id: Uuid) -> Result<Script, ApiError> {
    let script = state
        .store
        .get_script(id)
        .await?
        .ok_or(ApiError::NotFound("Script"))?;
    if !can_modify(script.user_id, user_id) {
        warn!(%user_id, script_id = %id, "script ownership check failed");
        return Err(ApiError::Forbidden(
            "You can only modify your own scripts".into(),
        ));
    }
    Ok(script)
}

fn location(id: Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("/api/scripts/{}", id).parse() {
        headers.insert(axum::http::header::LOCATION, value);
    }
    headers
}

async fn author_name(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    state
        .store
        .find_user_by_id(user_id)
        .await?
        .map(|u| u.username)
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))
}

#[instrument(skip(state))]
pub async fn list_scripts(
    State(state): State<AppState>,
    MaybeAuthUser(requester): MaybeAuthUser,
    ValidQuery(query): ValidQuery<ScriptQuery>,
) -> Result<Json<Vec<Script>>, ApiError> {
    let scripts = state.store.list_scripts(&query.into()).await?;
    let visible = scripts
        .into_iter()
        .filter(|s| can_view(s, requester))
        .collect();
    Ok(Json(visible))
}

#[instrument(skip(state))]
pub async fn get_script(
    State(state): State<AppState>,
    MaybeAuthUser(requester): MaybeAuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Script>, ApiError> {
    Ok(Json(visible_script(&state, id, requester).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_script(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<CreateScriptRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Script>), ApiError> {
    let author = author_name(&state, user_id).await?;
    let script = state
        .store
        .create_script(NewScript {
            name: payload.name.trim().to_string(),
            description: payload.description.trim().to_string(),
            category: payload.category.trim().to_lowercase(),
            code: payload.code,
            user_id: Some(user_id),
            author_name: author,
            is_public: payload.is_public,
        })
        .await?;

    info!(%user_id, script_id = %script.id, "script created");
    Ok((StatusCode::CREATED, location(script.id), Json(script)))
}

#[instrument(skip(state, payload))]
pub async fn update_script(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateScriptRequest>,
) -> Result<Json<Script>, ApiError> {
    owned_script(&state, id, user_id).await?;
    let script = state
        .store
        .update_script(id, payload.into())
        .await?
        .ok_or(ApiError::NotFound("Script"))?;

    info!(%user_id, script_id = %id, "script updated");
    Ok(Json(script))
}

#[instrument(skip(state))]
pub async fn delete_script(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    owned_script(&state, id, user_id).await?;
    if !state.store.delete_script(id).await? {
        return Err(ApiError::NotFound("Script"));
    }

    info!(%user_id, script_id = %id, "script deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Counts a run; open to anonymous visitors.
#[instrument(skip(state))]
pub async fn execute_script(
    State(state): State<AppState>,
    MaybeAuthUser(requester): MaybeAuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    visible_script(&state, id, requester).await?;
    let script = state
        .store
        .increment_script_executions(id)
        .await?
        .ok_or(ApiError::NotFound("Script"))?;
    Ok(Json(ExecuteResponse {
        success: true,
        execution_count: script.execution_count,
    }))
}

/// Flips the favorite flag; any signed-in user may favorite any visible script.
#[instrument(skip(state))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    visible_script(&state, id, Some(user_id)).await?;
    let script = state
        .store
        .toggle_script_favorite(id)
        .await?
        .ok_or(ApiError::NotFound("Script"))?;
    Ok(Json(FavoriteResponse {
        success: true,
        is_favorite: script.is_favorite,
    }))
}

#[instrument(skip(state, payload))]
pub async fn generate_script(
    State(state): State<AppState>,
    MaybeAuthUser(requester): MaybeAuthUser,
    ValidJson(payload): ValidJson<GenerateScriptRequest>,
) -> Result<Json<GenerateScriptResponse>, ApiError> {
    let model = payload
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(state.config.completion.default_model.as_str());
    let template = payload.template.as_deref().filter(|t| !t.trim().is_empty());

    let generated = generate(
        state.completion.as_deref(),
        payload.prompt.trim(),
        template,
        model,
    )
    .await;

    let author = match requester {
        Some(user_id) => author_name(&state, user_id).await?,
        None => ANONYMOUS_AUTHOR.to_string(),
    };

    let script = state
        .store
        .create_script(NewScript {
            name: generated.name,
            description: generated.description,
            category: generated.category,
            code: generated.code.clone(),
            user_id: requester,
            author_name: author,
            is_public: true,
        })
        .await?;

    info!(script_id = %script.id, owner = ?requester, "generated script saved");
    Ok(Json(GenerateScriptResponse {
        script,
        generated_code: generated.code,
    }))
}

pub async fn list_categories() -> Json<&'static [&'static str]> {
    Json(CATEGORIES)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::completion::CompletionClient;
    use crate::state::AppState;
    use crate::test_support::{app_with_state, register, send, test_app};

    async fn create(app: &axum::Router, token: &str, name: &str, is_public: bool) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/scripts",
            Some(token),
            Some(json!({
                "name": name,
                "description": format!("{name} does things"),
                "category": "Utility",
                "code": "print('hello')",
                "isPublic": is_public,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }

    #[tokio::test]
    async fn create_stamps_owner_from_session() {
        let app = test_app();
        let (token, user_id) = register(&app, "owner").await;
        let script = create(&app, &token, "ESP Overlay", true).await;
        assert_eq!(script["userId"], user_id.to_string());
        assert_eq!(script["authorName"], "owner");
        assert_eq!(script["category"], "utility");
        assert_eq!(script["executionCount"], 0);
        assert_eq!(script["isFavorite"], false);
    }

    #[tokio::test]
    async fn create_requires_auth_and_valid_body() {
        let app = test_app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/scripts",
            None,
            Some(json!({"name": "x", "category": "utility", "code": "y"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (token, _) = register(&app, "validator").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/scripts",
            Some(&token),
            Some(json!({"name": "", "category": "utility", "code": "y"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "name is required");
    }

    #[tokio::test]
    async fn non_owner_cannot_patch_or_delete() {
        let app = test_app();
        let (owner, _) = register(&app, "alice").await;
        let (intruder, _) = register(&app, "mallory").await;
        let script = create(&app, &owner, "Speed Boost", true).await;
        let uri = format!("/api/scripts/{}", script["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(&intruder),
            Some(json!({"name": "Pwned"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().is_some());

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Speed Boost");
        assert_eq!(body["updatedAt"], script["updatedAt"]);
    }

    #[tokio::test]
    async fn owner_can_patch_and_delete() {
        let app = test_app();
        let (token, _) = register(&app, "bob").await;
        let script = create(&app, &token, "Fly", true).await;
        let uri = format!("/api/scripts/{}", script["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({"name": "Fly v2", "isPublic": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Fly v2");
        assert_eq!(body["isPublic"], false);
        assert_eq!(body["code"], "print('hello')");

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_script_is_404() {
        let app = test_app();
        let (token, _) = register(&app, "carol").await;
        let uri = format!("/api/scripts/{}", uuid::Uuid::new_v4());

        let (status, body) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Script not found");

        let (status, _) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({"name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn anonymous_list_hides_private_scripts() {
        let app = test_app();
        let (token, _) = register(&app, "dave").await;
        let (other, _) = register(&app, "erin").await;
        create(&app, &token, "Public One", true).await;
        create(&app, &token, "Secret One", false).await;

        let names = |body: &Value| -> Vec<String> {
            body.as_array()
                .unwrap()
                .iter()
                .map(|s| s["name"].as_str().unwrap().to_string())
                .collect()
        };

        let (status, body) = send(&app, Method::GET, "/api/scripts", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body), vec!["Public One"]);

        let (_, body) = send(&app, Method::GET, "/api/scripts", Some(&other), None).await;
        assert_eq!(names(&body), vec!["Public One"]);

        let (_, body) = send(&app, Method::GET, "/api/scripts", Some(&token), None).await;
        let mut own = names(&body);
        own.sort();
        assert_eq!(own, vec!["Public One", "Secret One"]);
    }

    #[tokio::test]
    async fn list_filters_by_category_and_search() {
        let app = test_app();
        let (token, _) = register(&app, "frank").await;
        create(&app, &token, "Auto Clicker", true).await;
        create(&app, &token, "Wall Hop", true).await;

        let (_, body) = send(&app, Method::GET, "/api/scripts?search=clicker", None, None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = send(&app, Method::GET, "/api/scripts?category=combat", None, None).await;
        assert!(body.as_array().unwrap().is_empty());

        let (_, body) = send(&app, Method::GET, "/api/scripts?category=UTILITY", None, None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn private_script_is_hidden_from_strangers() {
        let app = test_app();
        let (owner, _) = register(&app, "grace").await;
        let (other, _) = register(&app, "heidi").await;
        let script = create(&app, &owner, "Hidden", false).await;
        let uri = format!("/api/scripts/{}", script["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::GET, &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn favorite_toggles_back_and_forth() {
        let app = test_app();
        let (owner, _) = register(&app, "ivan").await;
        let (fan, _) = register(&app, "judy").await;
        let script = create(&app, &owner, "Teleport", true).await;
        let uri = format!("/api/scripts/{}/favorite", script["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::POST, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, Method::POST, &uri, Some(&fan), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isFavorite"], true);

        let (_, body) = send(&app, Method::POST, &uri, Some(&fan), None).await;
        assert_eq!(body["isFavorite"], false);
    }

    #[tokio::test]
    async fn execute_counts_without_auth() {
        let app = test_app();
        let (token, _) = register(&app, "kim").await;
        let script = create(&app, &token, "Noclip", true).await;
        let uri = format!("/api/scripts/{}/execute", script["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::POST, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["executionCount"], 1);
        let (_, body) = send(&app, Method::POST, &uri, None, None).await;
        assert_eq!(body["executionCount"], 2);

        let missing = format!("/api/scripts/{}/execute", uuid::Uuid::new_v4());
        let (status, _) = send(&app, Method::POST, &missing, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generate_fishing_template_without_service() {
        let app = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/scripts/generate",
            None,
            Some(json!({"prompt": "fish", "template": "fishing"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["script"]["code"].as_str().unwrap().contains("Fishing Script"));
        assert!(body["generatedCode"].as_str().unwrap().contains("Fishing Script"));
        assert_eq!(body["script"]["name"], "Fishing Script");
        assert_eq!(body["script"]["userId"], Value::Null);
        assert_eq!(body["script"]["authorName"], "AI Generator");

        let (_, list) = send(&app, Method::GET, "/api/scripts", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generate_by_signed_in_user_is_owned() {
        let app = test_app();
        let (token, user_id) = register(&app, "leo").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/scripts/generate",
            Some(&token),
            Some(json!({"prompt": "farm wheat", "template": "farming"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["script"]["userId"], user_id.to_string());
        assert_eq!(body["script"]["authorName"], "leo");
        assert_eq!(body["script"]["category"], "farming");
    }

    #[tokio::test]
    async fn generate_rejects_blank_prompt() {
        let app = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/scripts/generate",
            None,
            Some(json!({"prompt": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "prompt is required");
    }

    struct EchoCompletion;

    #[async_trait]
    impl CompletionClient for EchoCompletion {
        async fn complete(
            &self,
            prompt: &str,
            _template: Option<&str>,
            model: &str,
        ) -> anyhow::Result<String> {
            Ok(format!(
                "-- Echo Script\n-- Description: model {model}\nprint('{prompt}')"
            ))
        }
    }

    #[tokio::test]
    async fn generate_uses_completion_service_and_default_model() {
        let app = app_with_state(AppState::fake().with_completion(Arc::new(EchoCompletion)));
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/scripts/generate",
            None,
            Some(json!({"prompt": "wave"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["script"]["name"], "Echo Script");
        assert_eq!(body["script"]["description"], "model test-model");
        assert!(body["generatedCode"].as_str().unwrap().contains("print('wave')"));
    }

    #[tokio::test]
    async fn categories_are_static() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/api/categories", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().iter().any(|c| c == "fishing"));
    }

    #[tokio::test]
    async fn malformed_id_is_json_400() {
        let app = test_app();
        let (token, _) = register(&app, "mallory").await;
        for (method, token) in [(Method::GET, None), (Method::DELETE, Some(token.as_str()))] {
            let (status, body) = send(&app, method, "/api/scripts/not-a-uuid", token, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string(), "unexpected body: {body}");
        }
    }
}
