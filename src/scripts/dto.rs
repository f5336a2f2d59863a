use serde::{Deserialize, Serialize};

use super::repo_types::{Script, ScriptFilter, ScriptPatch};
use crate::{
    error::ApiError,
    validation::{check_len, check_opt_len, Validate},
};

const MAX_NAME: usize = 100;
const MAX_DESCRIPTION: usize = 1000;
const MAX_CATEGORY: usize = 50;
const MAX_CODE: usize = 100_000;
const MAX_PROMPT: usize = 2000;

#[derive(Debug, Default, Deserialize)]
pub struct ScriptQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl From<ScriptQuery> for ScriptFilter {
    fn from(q: ScriptQuery) -> Self {
        let non_empty = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        ScriptFilter {
            category: non_empty(q.category),
            search: non_empty(q.search),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScriptRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub code: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl Validate for CreateScriptRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("name", &self.name, 1, MAX_NAME)?;
        check_len("description", &self.description, 0, MAX_DESCRIPTION)?;
        check_len("category", &self.category, 1, MAX_CATEGORY)?;
        check_len("code", &self.code, 1, MAX_CODE)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScriptRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub code: Option<String>,
    pub is_public: Option<bool>,
}

impl Validate for UpdateScriptRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_opt_len("name", self.name.as_deref(), 1, MAX_NAME)?;
        check_opt_len("description", self.description.as_deref(), 0, MAX_DESCRIPTION)?;
        check_opt_len("category", self.category.as_deref(), 1, MAX_CATEGORY)?;
        check_opt_len("code", self.code.as_deref(), 1, MAX_CODE)
    }
}

impl From<UpdateScriptRequest> for ScriptPatch {
    fn from(r: UpdateScriptRequest) -> Self {
        ScriptPatch {
            name: r.name.map(|v| v.trim().to_string()),
            description: r.description.map(|v| v.trim().to_string()),
            category: r.category.map(|v| v.trim().to_lowercase()),
            code: r.code,
            is_public: r.is_public,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateScriptRequest {
    pub prompt: String,
    pub template: Option<String>,
    pub model: Option<String>,
}

impl Validate for GenerateScriptRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("prompt", &self.prompt, 1, MAX_PROMPT)?;
        check_opt_len("template", self.template.as_deref(), 0, 50)?;
        check_opt_len("model", self.model.as_deref(), 0, 100)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScriptResponse {
    pub script: Script,
    pub generated_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    pub execution_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub success: bool,
    pub is_favorite: bool,
}
