//! Storage adapter used by every resource handler.
//!
//! Each method is a single atomic operation against the backend; nothing here
//! spans several calls. Lookups return `Ok(None)` / `Ok(false)` for missing
//! rows so handlers can map them to 404 themselves.

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::game::repo_types::{GameAccount, NewGameAccount};
use crate::news::repo_types::{ArticlePatch, NewArticle, NewsArticle};
use crate::scripts::repo_types::{NewScript, Script, ScriptFilter, ScriptPatch};
use crate::stats::repo_types::{NewSnapshot, SystemStatsSnapshot};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Typed store failures callers react to; everything else stays `anyhow`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique column (`"email"` or `"username"`) already holds the value.
    #[error("duplicate {0}")]
    Duplicate(&'static str),
}

#[async_trait]
pub trait Store: Send + Sync {
    // users
    /// Fails with [`StoreError::Duplicate`] when the email or username is taken.
    async fn create_user(&self, user: NewUser) -> anyhow::Result<User>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    // scripts
    async fn list_scripts(&self, filter: &ScriptFilter) -> anyhow::Result<Vec<Script>>;
    async fn get_script(&self, id: Uuid) -> anyhow::Result<Option<Script>>;
    async fn create_script(&self, script: NewScript) -> anyhow::Result<Script>;
    async fn update_script(&self, id: Uuid, patch: ScriptPatch) -> anyhow::Result<Option<Script>>;
    async fn delete_script(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn increment_script_executions(&self, id: Uuid) -> anyhow::Result<Option<Script>>;
    async fn toggle_script_favorite(&self, id: Uuid) -> anyhow::Result<Option<Script>>;

    // news
    async fn list_news(&self, category: Option<&str>) -> anyhow::Result<Vec<NewsArticle>>;
    async fn get_news(&self, id: Uuid) -> anyhow::Result<Option<NewsArticle>>;
    async fn create_news(&self, article: NewArticle) -> anyhow::Result<NewsArticle>;
    async fn update_news(&self, id: Uuid, patch: ArticlePatch)
        -> anyhow::Result<Option<NewsArticle>>;
    async fn delete_news(&self, id: Uuid) -> anyhow::Result<bool>;

    // system stats
    async fn record_stats(&self, snapshot: NewSnapshot) -> anyhow::Result<SystemStatsSnapshot>;
    async fn latest_stats(&self) -> anyhow::Result<Option<SystemStatsSnapshot>>;
    /// Newest first.
    async fn stats_history(&self, limit: i64) -> anyhow::Result<Vec<SystemStatsSnapshot>>;

    // game accounts
    async fn list_game_accounts(&self, user_id: Uuid) -> anyhow::Result<Vec<GameAccount>>;
    async fn get_game_account(&self, id: Uuid) -> anyhow::Result<Option<GameAccount>>;
    async fn create_game_account(&self, account: NewGameAccount) -> anyhow::Result<GameAccount>;
    async fn delete_game_account(&self, id: Uuid) -> anyhow::Result<bool>;

    // revoked session tokens
    async fn revoke_token(&self, jti: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<()>;
    async fn is_token_revoked(&self, jti: Uuid) -> anyhow::Result<bool>;
}
