use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::auth::repo_types::{NewUser, User};
use crate::game::repo_types::{GameAccount, NewGameAccount};
use crate::news::repo_types::{ArticlePatch, NewArticle, NewsArticle};
use crate::scripts::repo_types::{NewScript, Script, ScriptFilter, ScriptPatch};
use crate::stats::repo_types::{NewSnapshot, SystemStatsSnapshot};

/// Process-local store for development and tests. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    scripts: HashMap<Uuid, Script>,
    news: HashMap<Uuid, NewsArticle>,
    stats: Vec<SystemStatsSnapshot>,
    game_accounts: HashMap<Uuid, GameAccount>,
    revoked: HashMap<Uuid, OffsetDateTime>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, id as tie-break so the order is stable.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (OffsetDateTime, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> anyhow::Result<User> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email").into());
        }
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username").into());
        }
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_scripts(&self, filter: &ScriptFilter) -> anyhow::Result<Vec<Script>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Script> = inner
            .scripts
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        newest_first(&mut rows, |s| (s.created_at, s.id));
        Ok(rows)
    }

    async fn get_script(&self, id: Uuid) -> anyhow::Result<Option<Script>> {
        Ok(self.inner.read().await.scripts.get(&id).cloned())
    }

    async fn create_script(&self, script: NewScript) -> anyhow::Result<Script> {
        let now = OffsetDateTime::now_utc();
        let record = Script {
            id: Uuid::new_v4(),
            name: script.name,
            description: script.description,
            category: script.category,
            code: script.code,
            user_id: script.user_id,
            author_name: script.author_name,
            is_public: script.is_public,
            is_favorite: false,
            execution_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .scripts
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_script(&self, id: Uuid, patch: ScriptPatch) -> anyhow::Result<Option<Script>> {
        let mut inner = self.inner.write().await;
        let Some(script) = inner.scripts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.name {
            script.name = v;
        }
        if let Some(v) = patch.description {
            script.description = v;
        }
        if let Some(v) = patch.category {
            script.category = v;
        }
        if let Some(v) = patch.code {
            script.code = v;
        }
        if let Some(v) = patch.is_public {
            script.is_public = v;
        }
        script.updated_at = OffsetDateTime::now_utc();
        Ok(Some(script.clone()))
    }

    async fn delete_script(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.inner.write().await.scripts.remove(&id).is_some())
    }

    async fn increment_script_executions(&self, id: Uuid) -> anyhow::Result<Option<Script>> {
        let mut inner = self.inner.write().await;
        Ok(inner.scripts.get_mut(&id).map(|s| {
            s.execution_count += 1;
            s.clone()
        }))
    }

    async fn toggle_script_favorite(&self, id: Uuid) -> anyhow::Result<Option<Script>> {
        let mut inner = self.inner.write().await;
        Ok(inner.scripts.get_mut(&id).map(|s| {
            s.is_favorite = !s.is_favorite;
            s.updated_at = OffsetDateTime::now_utc();
            s.clone()
        }))
    }

    async fn list_news(&self, category: Option<&str>) -> anyhow::Result<Vec<NewsArticle>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<NewsArticle> = inner
            .news
            .values()
            .filter(|a| category.map_or(true, |c| a.category.eq_ignore_ascii_case(c)))
            .cloned()
            .collect();
        newest_first(&mut rows, |a| (a.created_at, a.id));
        Ok(rows)
    }

    async fn get_news(&self, id: Uuid) -> anyhow::Result<Option<NewsArticle>> {
        Ok(self.inner.read().await.news.get(&id).cloned())
    }

    async fn create_news(&self, article: NewArticle) -> anyhow::Result<NewsArticle> {
        let now = OffsetDateTime::now_utc();
        let record = NewsArticle {
            id: Uuid::new_v4(),
            title: article.title,
            summary: article.summary,
            content: article.content,
            category: article.category,
            source: article.source,
            author: article.author,
            is_hot: article.is_hot,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .news
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_news(
        &self,
        id: Uuid,
        patch: ArticlePatch,
    ) -> anyhow::Result<Option<NewsArticle>> {
        let mut inner = self.inner.write().await;
        let Some(article) = inner.news.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.title {
            article.title = v;
        }
        if let Some(v) = patch.summary {
            article.summary = v;
        }
        if let Some(v) = patch.content {
            article.content = v;
        }
        if let Some(v) = patch.category {
            article.category = v;
        }
        if let Some(v) = patch.source {
            article.source = v;
        }
        if let Some(v) = patch.author {
            article.author = v;
        }
        if let Some(v) = patch.is_hot {
            article.is_hot = v;
        }
        article.updated_at = OffsetDateTime::now_utc();
        Ok(Some(article.clone()))
    }

    async fn delete_news(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.inner.write().await.news.remove(&id).is_some())
    }

    async fn record_stats(&self, snapshot: NewSnapshot) -> anyhow::Result<SystemStatsSnapshot> {
        let record = SystemStatsSnapshot {
            id: Uuid::new_v4(),
            cpu_usage: snapshot.cpu_usage,
            ram_usage: snapshot.ram_usage,
            gpu_usage: snapshot.gpu_usage,
            disk_usage: snapshot.disk_usage,
            temperature: snapshot.temperature,
            fps: snapshot.fps,
            ping: snapshot.ping,
            recorded_at: OffsetDateTime::now_utc(),
        };
        self.inner.write().await.stats.push(record.clone());
        Ok(record)
    }

    async fn latest_stats(&self) -> anyhow::Result<Option<SystemStatsSnapshot>> {
        Ok(self.inner.read().await.stats.last().cloned())
    }

    async fn stats_history(&self, limit: i64) -> anyhow::Result<Vec<SystemStatsSnapshot>> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(0);
        let inner = self.inner.read().await;
        Ok(inner.stats.iter().rev().take(limit).cloned().collect())
    }

    async fn list_game_accounts(&self, user_id: Uuid) -> anyhow::Result<Vec<GameAccount>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<GameAccount> = inner
            .game_accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |a| (a.created_at, a.id));
        Ok(rows)
    }

    async fn get_game_account(&self, id: Uuid) -> anyhow::Result<Option<GameAccount>> {
        Ok(self.inner.read().await.game_accounts.get(&id).cloned())
    }

    async fn create_game_account(&self, account: NewGameAccount) -> anyhow::Result<GameAccount> {
        let record = GameAccount {
            id: Uuid::new_v4(),
            user_id: account.user_id,
            username: account.username,
            game: account.game,
            created_at: OffsetDateTime::now_utc(),
        };
        self.inner
            .write()
            .await
            .game_accounts
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_game_account(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.inner.write().await.game_accounts.remove(&id).is_some())
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.inner.write().await;
        inner.revoked.retain(|_, exp| *exp > now);
        inner.revoked.insert(jti, expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> anyhow::Result<bool> {
        Ok(self.inner.read().await.revoked.contains_key(&jti))
    }
}
