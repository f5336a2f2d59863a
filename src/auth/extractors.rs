use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use super::jwt::JwtKeys;
use crate::{error::ApiError, state::AppState};

/// Authenticated user ID; rejects with 401 when the request is anonymous.
pub struct AuthUser(pub Uuid);

/// Optional user ID; absent, invalid or revoked tokens yield `None`.
pub struct MaybeAuthUser(pub Option<Uuid>);

/// Verified access-token claims; rejects with 401 like [`AuthUser`].
pub struct AuthClaims(pub Claims);

/// Reads the bearer token and checks signature, kind and revocation.
async fn session_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(ApiError::unauthorized)?;

    // Expect "Bearer <token>"
    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

    let keys = JwtKeys::from_config(&state.config.jwt);
    let claims = keys
        .verify(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

    if claims.kind != TokenKind::Access {
        return Err(ApiError::Unauthorized("Access token required".into()));
    }

    if state.store.is_token_revoked(claims.jti).await? {
        return Err(ApiError::Unauthorized("Session has ended".into()));
    }

    Ok(claims)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_claims(parts, state).await.map(AuthClaims)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = session_claims(parts, state).await?;
        Ok(AuthUser(claims.sub))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        match session_claims(parts, state).await {
            Ok(claims) => Ok(MaybeAuthUser(Some(claims.sub))),
            Err(ApiError::Internal(e)) => {
                warn!(error = %format!("{e:#}"), "session lookup failed; treating as anonymous");
                Ok(MaybeAuthUser(None))
            }
            Err(_) => Ok(MaybeAuthUser(None)),
        }
    }
}
