use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::auth::repo_types::{NewUser, User};
use crate::game::repo_types::{GameAccount, NewGameAccount};
use crate::news::repo_types::{ArticlePatch, NewArticle, NewsArticle};
use crate::scripts::repo_types::{NewScript, Script, ScriptFilter, ScriptPatch};
use crate::stats::repo_types::{NewSnapshot, SystemStatsSnapshot};

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at";
const SCRIPT_COLUMNS: &str = "id, name, description, category, code, user_id, author_name, \
     is_public, is_favorite, execution_count, created_at, updated_at";
const NEWS_COLUMNS: &str =
    "id, title, summary, content, category, source, author, is_hot, created_at, updated_at";
const STATS_COLUMNS: &str =
    "id, cpu_usage, ram_usage, gpu_usage, disk_usage, temperature, fps, ping, recorded_at";
const GAME_ACCOUNT_COLUMNS: &str = "id, user_id, username, game, created_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self { db })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await;
        match row {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                let column = match db.constraint() {
                    Some(c) if c.contains("username") => "username",
                    _ => "email",
                };
                Err(StoreError::Duplicate(column).into())
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user")),
        }
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(row)
    }

    async fn list_scripts(&self, filter: &ScriptFilter) -> anyhow::Result<Vec<Script>> {
        let rows = sqlx::query_as::<_, Script>(&format!(
            r#"
            SELECT {SCRIPT_COLUMNS}
            FROM scripts
            WHERE ($1::text IS NULL OR lower(category) = lower($1))
              AND ($2::text IS NULL
                   OR strpos(lower(name), lower($2)) > 0
                   OR strpos(lower(description), lower($2)) > 0)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.category.as_deref())
        .bind(filter.search.as_deref())
        .fetch_all(&self.db)
        .await
        .context("list scripts")?;
        Ok(rows)
    }

    async fn get_script(&self, id: Uuid) -> anyhow::Result<Option<Script>> {
        let row = sqlx::query_as::<_, Script>(&format!(
            "SELECT {SCRIPT_COLUMNS} FROM scripts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get script")?;
        Ok(row)
    }

    async fn create_script(&self, script: NewScript) -> anyhow::Result<Script> {
        let row = sqlx::query_as::<_, Script>(&format!(
            r#"
            INSERT INTO scripts (name, description, category, code, user_id, author_name, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SCRIPT_COLUMNS}
            "#
        ))
        .bind(&script.name)
        .bind(&script.description)
        .bind(&script.category)
        .bind(&script.code)
        .bind(script.user_id)
        .bind(&script.author_name)
        .bind(script.is_public)
        .fetch_one(&self.db)
        .await
        .context("insert script")?;
        Ok(row)
    }

    async fn update_script(&self, id: Uuid, patch: ScriptPatch) -> anyhow::Result<Option<Script>> {
        let row = sqlx::query_as::<_, Script>(&format!(
            r#"
            UPDATE scripts
               SET name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   category = COALESCE($4, category),
                   code = COALESCE($5, code),
                   is_public = COALESCE($6, is_public),
                   updated_at = now()
             WHERE id = $1
            RETURNING {SCRIPT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.category)
        .bind(patch.code)
        .bind(patch.is_public)
        .fetch_optional(&self.db)
        .await
        .context("update script")?;
        Ok(row)
    }

    async fn delete_script(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM scripts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete script")?;
        Ok(res.rows_affected() > 0)
    }

    async fn increment_script_executions(&self, id: Uuid) -> anyhow::Result<Option<Script>> {
        let row = sqlx::query_as::<_, Script>(&format!(
            r#"
            UPDATE scripts SET execution_count = execution_count + 1
             WHERE id = $1
            RETURNING {SCRIPT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("increment script executions")?;
        Ok(row)
    }

    async fn toggle_script_favorite(&self, id: Uuid) -> anyhow::Result<Option<Script>> {
        let row = sqlx::query_as::<_, Script>(&format!(
            r#"
            UPDATE scripts SET is_favorite = NOT is_favorite, updated_at = now()
             WHERE id = $1
            RETURNING {SCRIPT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("toggle script favorite")?;
        Ok(row)
    }

    async fn list_news(&self, category: Option<&str>) -> anyhow::Result<Vec<NewsArticle>> {
        let rows = sqlx::query_as::<_, NewsArticle>(&format!(
            r#"
            SELECT {NEWS_COLUMNS}
            FROM news_articles
            WHERE ($1::text IS NULL OR lower(category) = lower($1))
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(category)
        .fetch_all(&self.db)
        .await
        .context("list news")?;
        Ok(rows)
    }

    async fn get_news(&self, id: Uuid) -> anyhow::Result<Option<NewsArticle>> {
        let row = sqlx::query_as::<_, NewsArticle>(&format!(
            "SELECT {NEWS_COLUMNS} FROM news_articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get news article")?;
        Ok(row)
    }

    async fn create_news(&self, article: NewArticle) -> anyhow::Result<NewsArticle> {
        let row = sqlx::query_as::<_, NewsArticle>(&format!(
            r#"
            INSERT INTO news_articles (title, summary, content, category, source, author, is_hot)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NEWS_COLUMNS}
            "#
        ))
        .bind(&article.title)
        .bind(&article.summary)
        .bind(&article.content)
        .bind(&article.category)
        .bind(&article.source)
        .bind(&article.author)
        .bind(article.is_hot)
        .fetch_one(&self.db)
        .await
        .context("insert news article")?;
        Ok(row)
    }

    async fn update_news(
        &self,
        id: Uuid,
        patch: ArticlePatch,
    ) -> anyhow::Result<Option<NewsArticle>> {
        let row = sqlx::query_as::<_, NewsArticle>(&format!(
            r#"
            UPDATE news_articles
               SET title = COALESCE($2, title),
                   summary = COALESCE($3, summary),
                   content = COALESCE($4, content),
                   category = COALESCE($5, category),
                   source = COALESCE($6, source),
                   author = COALESCE($7, author),
                   is_hot = COALESCE($8, is_hot),
                   updated_at = now()
             WHERE id = $1
            RETURNING {NEWS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.summary)
        .bind(patch.content)
        .bind(patch.category)
        .bind(patch.source)
        .bind(patch.author)
        .bind(patch.is_hot)
        .fetch_optional(&self.db)
        .await
        .context("update news article")?;
        Ok(row)
    }

    async fn delete_news(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM news_articles WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete news article")?;
        Ok(res.rows_affected() > 0)
    }

    async fn record_stats(&self, s: NewSnapshot) -> anyhow::Result<SystemStatsSnapshot> {
        let row = sqlx::query_as::<_, SystemStatsSnapshot>(&format!(
            r#"
            INSERT INTO system_stats
                (cpu_usage, ram_usage, gpu_usage, disk_usage, temperature, fps, ping)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {STATS_COLUMNS}
            "#
        ))
        .bind(s.cpu_usage)
        .bind(s.ram_usage)
        .bind(s.gpu_usage)
        .bind(s.disk_usage)
        .bind(s.temperature)
        .bind(s.fps)
        .bind(s.ping)
        .fetch_one(&self.db)
        .await
        .context("insert system stats")?;
        Ok(row)
    }

    async fn latest_stats(&self) -> anyhow::Result<Option<SystemStatsSnapshot>> {
        let row = sqlx::query_as::<_, SystemStatsSnapshot>(&format!(
            "SELECT {STATS_COLUMNS} FROM system_stats ORDER BY recorded_at DESC, seq DESC LIMIT 1"
        ))
        .fetch_optional(&self.db)
        .await
        .context("latest system stats")?;
        Ok(row)
    }

    async fn stats_history(&self, limit: i64) -> anyhow::Result<Vec<SystemStatsSnapshot>> {
        let rows = sqlx::query_as::<_, SystemStatsSnapshot>(&format!(
            r#"
            SELECT {STATS_COLUMNS}
            FROM system_stats
            ORDER BY recorded_at DESC, seq DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("system stats history")?;
        Ok(rows)
    }

    async fn list_game_accounts(&self, user_id: Uuid) -> anyhow::Result<Vec<GameAccount>> {
        let rows = sqlx::query_as::<_, GameAccount>(&format!(
            r#"
            SELECT {GAME_ACCOUNT_COLUMNS}
            FROM game_accounts
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list game accounts")?;
        Ok(rows)
    }

    async fn get_game_account(&self, id: Uuid) -> anyhow::Result<Option<GameAccount>> {
        let row = sqlx::query_as::<_, GameAccount>(&format!(
            "SELECT {GAME_ACCOUNT_COLUMNS} FROM game_accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get game account")?;
        Ok(row)
    }

    async fn create_game_account(&self, account: NewGameAccount) -> anyhow::Result<GameAccount> {
        let row = sqlx::query_as::<_, GameAccount>(&format!(
            r#"
            INSERT INTO game_accounts (user_id, username, game)
            VALUES ($1, $2, $3)
            RETURNING {GAME_ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account.user_id)
        .bind(&account.username)
        .bind(&account.game)
        .fetch_one(&self.db)
        .await
        .context("insert game account")?;
        Ok(row)
    }

    async fn delete_game_account(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM game_accounts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete game account")?;
        Ok(res.rows_affected() > 0)
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
            .execute(&self.db)
            .await
            .context("purge revoked tokens")?;
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("revoke token")?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> anyhow::Result<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT jti FROM revoked_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.db)
            .await
            .context("check revoked token")?;
        Ok(row.is_some())
    }
}
