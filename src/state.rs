use crate::completion::{CompletionClient, OpenAiClient};
use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, Store};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    /// External text generation; `None` falls back to built-in templates.
    pub completion: Option<Arc<dyn CompletionClient>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                Arc::new(PgStore::connect(url, config.max_connections).await?) as Arc<dyn Store>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        let completion = OpenAiClient::from_config(&config.completion)?
            .map(|c| Arc::new(c) as Arc<dyn CompletionClient>);
        if completion.is_none() {
            tracing::info!("OPENAI_API_KEY not set; script generation uses templates");
        }

        Ok(Self {
            store,
            config,
            completion,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{CompletionConfig, JwtConfig};

        let config = Arc::new(AppConfig {
            database_url: None,
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            completion: CompletionConfig {
                api_key: None,
                base_url: "http://localhost".into(),
                default_model: "test-model".into(),
                timeout_secs: 1,
            },
        });

        Self {
            store: Arc::new(MemoryStore::new()),
            config,
            completion: None,
        }
    }

    #[cfg(test)]
    pub fn with_completion(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }
}
