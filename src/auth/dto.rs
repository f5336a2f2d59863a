use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;
use super::services::{is_valid_email, is_valid_username, MIN_PASSWORD_LEN};
use crate::{error::ApiError, validation::Validate};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if !is_valid_email(&self.email.trim().to_lowercase()) {
            return Err(ApiError::validation("Invalid email"));
        }
        if !is_valid_username(self.username.trim()) {
            return Err(ApiError::validation(
                "Username must be 3-32 letters, digits or underscores",
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation("Password too short"));
        }
        Ok(())
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::validation("Username and password are required"));
        }
        Ok(())
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.refresh_token.trim().is_empty() {
            return Err(ApiError::validation("refreshToken is required"));
        }
        Ok(())
    }
}

/// Optional logout body; the refresh token is revoked along with the access token.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validation() {
        let ok = RegisterRequest {
            email: " Player@Example.com ".into(),
            username: "player_one".into(),
            password: "longenough".into(),
        };
        assert!(ok.validate().is_ok());

        let short = RegisterRequest {
            password: "short".into(),
            ..ok
        };
        assert_eq!(short.validate().unwrap_err().to_string(), "Password too short");
    }

    #[test]
    fn public_user_serialization_has_no_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            username: "tester".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&UserResponse { user: user.into() }).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("argon2"));
    }
}
