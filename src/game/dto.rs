use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    validation::{check_len, Validate},
};

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub game: String,
}

impl Validate for CreateAccountRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("username", &self.username, 1, 50)?;
        check_len("game", &self.game, 1, 50)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub account_id: Uuid,
    pub client_id: String,
}

impl Validate for LaunchRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("clientId", &self.client_id, 1, 50)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResponse {
    pub success: bool,
    pub client_id: String,
    pub account_id: Uuid,
    pub pid: Option<u32>,
}
