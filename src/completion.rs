//! Client for an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CompletionConfig;

const SYSTEM_PROMPT: &str = "You write Lua scripts for games. Reply with code only, no \
markdown. The first line must be `-- <Script Name>` and the second line \
`-- Description: <one sentence>`.";

/// Text generation used by the script generator.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        template: Option<&str>,
        model: &str,
    ) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(cfg: &CompletionConfig) -> anyhow::Result<Option<Self>> {
        match &cfg.api_key {
            Some(key) => Ok(Some(Self::new(
                &cfg.base_url,
                key,
                Duration::from_secs(cfg.timeout_secs),
            )?)),
            None => Ok(None),
        }
    }
}

fn user_message(prompt: &str, template: Option<&str>) -> String {
    match template {
        Some(t) if !t.trim().is_empty() => {
            format!("Write a {} script. Request: {}", t.trim(), prompt)
        }
        _ => format!("Write a script. Request: {prompt}"),
    }
}

/// Drops a surrounding markdown code fence if the model added one anyway.
pub(crate) fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        template: Option<&str>,
        model: &str,
    ) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_message(prompt, template),
                },
            ],
            temperature: 0.7,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("completion request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status.as_u16(), body));
        }

        let body: ChatResponse = resp.json().await.context("decode completion response")?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("completion returned no content"))?;

        debug!(model = %model, chars = text.len(), "completion received");
        Ok(strip_code_fence(&text))
    }
}
