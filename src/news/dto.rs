use serde::Deserialize;

use super::repo_types::ArticlePatch;
use crate::{
    error::ApiError,
    validation::{check_len, check_opt_len, Validate},
};

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub content: String,
    pub category: String,
    pub source: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub is_hot: bool,
}

impl Validate for CreateArticleRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_len("title", &self.title, 1, 200)?;
        check_len("summary", &self.summary, 0, 500)?;
        check_len("content", &self.content, 1, 50_000)?;
        check_len("category", &self.category, 1, 50)?;
        check_opt_len("source", self.source.as_deref(), 0, 100)?;
        check_opt_len("author", self.author.as_deref(), 0, 100)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    pub is_hot: Option<bool>,
}

impl Validate for UpdateArticleRequest {
    fn validate(&self) -> Result<(), ApiError> {
        check_opt_len("title", self.title.as_deref(), 1, 200)?;
        check_opt_len("summary", self.summary.as_deref(), 0, 500)?;
        check_opt_len("content", self.content.as_deref(), 1, 50_000)?;
        check_opt_len("category", self.category.as_deref(), 1, 50)?;
        check_opt_len("source", self.source.as_deref(), 1, 100)?;
        check_opt_len("author", self.author.as_deref(), 1, 100)
    }
}

impl From<UpdateArticleRequest> for ArticlePatch {
    fn from(r: UpdateArticleRequest) -> Self {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        ArticlePatch {
            title: trim(r.title),
            summary: trim(r.summary),
            content: r.content,
            category: r.category.map(|s| s.trim().to_lowercase()),
            source: trim(r.source),
            author: trim(r.author),
            is_hot: r.is_hot,
        }
    }
}
