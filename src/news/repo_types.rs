use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    pub source: String,
    pub author: String,
    pub is_hot: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    pub source: String,
    pub author: String,
    pub is_hot: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    pub is_hot: Option<bool>,
}
