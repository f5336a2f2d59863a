use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::templates;
use crate::completion::CompletionClient;

const FALLBACK_NAME: &str = "Generated Script";
const HEADER_LINES: usize = 5;
const MAX_NAME_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Generated code plus the metadata pulled from its header comments.
#[derive(Debug, Clone)]
pub struct GeneratedScript {
    pub code: String,
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Asks the completion service when one is configured, otherwise (or when it
/// fails) fills one of the canned templates.
pub async fn generate(
    completion: Option<&dyn CompletionClient>,
    prompt: &str,
    template: Option<&str>,
    model: &str,
) -> GeneratedScript {
    let code = match completion {
        Some(client) => match client.complete(prompt, template, model).await {
            Ok(text) => {
                info!(model = %model, "script generated by completion service");
                text
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "completion failed; using template");
                templates::render(template, prompt)
            }
        },
        None => templates::render(template, prompt),
    };

    let (name, description) = extract_metadata(&code, prompt);
    GeneratedScript {
        code,
        name,
        description,
        category: templates::category_for(template).to_string(),
    }
}

/// Reads `-- <Name>` and `-- Description: <text>` from the leading comment lines.
pub fn extract_metadata(code: &str, prompt: &str) -> (String, String) {
    lazy_static! {
        static ref COMMENT_RE: Regex = Regex::new(r"^\s*--+\s*(.+?)\s*$").unwrap();
        static ref DESCRIPTION_RE: Regex =
            Regex::new(r"(?i)^\s*--+\s*description\s*:\s*(.+?)\s*$").unwrap();
    }

    let header: Vec<&str> = code
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(HEADER_LINES)
        .collect();

    let description = header
        .iter()
        .find_map(|l| DESCRIPTION_RE.captures(l))
        .map(|c| c[1].to_string());

    let name = header
        .iter()
        .take_while(|l| COMMENT_RE.is_match(l))
        .filter(|l| !DESCRIPTION_RE.is_match(l))
        .find_map(|l| COMMENT_RE.captures(l))
        .map(|c| c[1].to_string())
        .filter(|n| !n.contains(':'));

    let name = truncate(name.as_deref().unwrap_or(FALLBACK_NAME), MAX_NAME_CHARS);
    let description = match description {
        Some(d) => truncate(&d, MAX_DESCRIPTION_CHARS),
        None => truncate(
            &format!("Generated from prompt: {}", prompt.trim()),
            MAX_DESCRIPTION_CHARS,
        ),
    };
    (name, description)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
