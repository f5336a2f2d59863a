use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Settings for the external text-generation service used by script generation.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// When absent, generation only uses the built-in templates.
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// When absent, the in-memory store is used.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub completion: CompletionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let max_connections = env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "scripthub".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "scripthub-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let completion = CompletionConfig {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            default_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".into()),
            timeout_secs: env_parse("OPENAI_TIMEOUT_SECS").unwrap_or(30),
        };
        Ok(Self {
            database_url,
            max_connections,
            jwt,
            completion,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_ignores_garbage() {
        std::env::set_var("SCRIPTHUB_TEST_NUMBER", "not-a-number");
        assert_eq!(env_parse::<i64>("SCRIPTHUB_TEST_NUMBER"), None);
        std::env::set_var("SCRIPTHUB_TEST_NUMBER", "42");
        assert_eq!(env_parse::<i64>("SCRIPTHUB_TEST_NUMBER"), Some(42));
        std::env::remove_var("SCRIPTHUB_TEST_NUMBER");
    }
}
