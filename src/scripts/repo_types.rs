use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Shared script record.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub code: String,
    /// Owning user; `None` for scripts generated anonymously.
    pub user_id: Option<Uuid>,
    pub author_name: String,
    pub is_public: bool,
    pub is_favorite: bool,
    pub execution_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewScript {
    pub name: String,
    pub description: String,
    pub category: String,
    pub code: String,
    pub user_id: Option<Uuid>,
    pub author_name: String,
    pub is_public: bool,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ScriptPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub code: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ScriptFilter {
    /// Same matching rules as the SQL query: exact category ignoring case,
    /// case-insensitive substring over name and description.
    pub fn matches(&self, script: &Script) -> bool {
        if let Some(category) = &self.category {
            if !script.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !script.name.to_lowercase().contains(&needle)
                && !script.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}
