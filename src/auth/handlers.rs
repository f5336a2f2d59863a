use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
            UserResponse,
        },
        extractors::{AuthClaims, AuthUser},
        jwt::{expires_at, JwtKeys},
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
    },
    error::ApiError,
    state::AppState,
    store::StoreError,
    validation::ValidJson,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

fn issue_session(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim().to_string();

    // Ensure email and username are not taken
    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::validation("Email already registered"));
    }
    if state.store.find_user_by_username(&username).await?.is_some() {
        warn!(username = %username, "username already taken");
        return Err(ApiError::validation("Username already taken"));
    }

    let password_hash = hash_password(&payload.password)?;
    let created = state
        .store
        .create_user(NewUser {
            email,
            username,
            password_hash,
        })
        .await;
    // A concurrent registration can still win between the checks and the insert.
    let user = match created {
        Ok(user) => user,
        Err(e) => {
            return Err(match e.downcast_ref::<StoreError>() {
                Some(StoreError::Duplicate("username")) => {
                    ApiError::validation("Username already taken")
                }
                Some(StoreError::Duplicate(_)) => ApiError::validation("Email already registered"),
                None => e.into(),
            });
        }
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(issue_session(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let username = payload.username.trim();

    let Some(user) = state.store.find_user_by_username(username).await? else {
        warn!(username = %username, "login unknown username");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(issue_session(&state, user)?))
}

#[instrument(skip(state, claims, body))]
pub async fn logout(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    body: Option<Json<LogoutRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.revoke_token(claims.jti, expires_at(&claims)).await?;

    let refresh_token = body.and_then(|Json(b)| b.refresh_token);
    if let Some(token) = refresh_token {
        let keys = JwtKeys::from_ref(&state);
        match keys.verify_refresh(&token) {
            Ok(refresh) if refresh.sub == claims.sub => {
                state
                    .store
                    .revoke_token(refresh.jti, expires_at(&refresh))
                    .await?;
            }
            _ => warn!(user_id = %claims.sub, "ignoring unusable refresh token on logout"),
        }
    }

    info!(user_id = %claims.sub, "user logged out");
    Ok(Json(serde_json::json!({ "success": true })))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    if state.store.is_token_revoked(claims.jti).await? {
        warn!(user_id = %claims.sub, "revoked refresh token presented");
        return Err(ApiError::Unauthorized("Session has ended".into()));
    }

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    // Rotate: the presented refresh token can't be used again
    state.store.revoke_token(claims.jti, expires_at(&claims)).await?;

    Ok(Json(issue_session(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %user_id, "user not found");
            ApiError::Unauthorized("User not found".into())
        })?;

    Ok(Json(UserResponse { user: user.into() }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{register, send, test_app};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_registrations_get_400() {
        let app = test_app();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move {
                    send(
                        &app,
                        Method::POST,
                        "/api/auth/register",
                        None,
                        Some(json!({
                            "email": "racer@example.com",
                            "username": "racer",
                            "password": "password123",
                        })),
                    )
                    .await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            let (status, body) = task.await.unwrap();
            match status {
                StatusCode::CREATED => created += 1,
                StatusCode::BAD_REQUEST => assert!(body["error"].is_string()),
                other => panic!("unexpected {other}: {body}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn register_returns_created_user_and_tokens() {
        let app = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": "Neo@Matrix.io", "username": "neo", "password": "redpill123"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "neo@matrix.io");
        assert_eq!(body["user"]["username"], "neo");
        assert!(body["user"].get("passwordHash").is_none());
        assert!(body["accessToken"].as_str().is_some());
        assert!(body["refreshToken"].as_str().is_some());
    }

    #[tokio::test]
    async fn duplicate_email_or_username_is_rejected() {
        let app = test_app();
        register(&app, "trinity").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "trinity@example.com",
                "username": "other",
                "password": "password123",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already registered");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "fresh@example.com",
                "username": "trinity",
                "password": "password123",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username already taken");

        // The failed attempts created nobody: logging in as "other" fails.
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "other", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_malformed_body() {
        let app = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": "missing-fields@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn login_checks_password() {
        let app = test_app();
        register(&app, "morpheus").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "morpheus", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "morpheus");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "morpheus", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn me_requires_a_session() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");

        let (token, user_id) = register(&app, "switch").await;
        let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user_id.to_string());
    }

    #[tokio::test]
    async fn logout_revokes_the_access_token() {
        let app = test_app();
        let (token, _) = register(&app, "tank").await;

        let (status, body) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_rotates_tokens() {
        let app = test_app();
        let (_, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "dozer@example.com",
                "username": "dozer",
                "password": "password123",
            })),
        )
        .await;
        let refresh_token = body["refreshToken"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({"refreshToken": refresh_token})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let access = body["accessToken"].as_str().unwrap().to_string();
        let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);

        // Second use of the same refresh token is refused
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({"refreshToken": refresh_token})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let app = test_app();
        let (token, _) = register(&app, "apoc").await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({"refreshToken": token})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
