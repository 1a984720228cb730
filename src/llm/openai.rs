//! OpenAI Responses API client.
//!
//! Sends a system message plus one user message whose content is an ordered
//! list of `input_text` and `input_file` blocks. PDFs travel as base64 data
//! URLs inside `input_file`, so the model reads them natively.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::ingest::PromptFragment;
use crate::llm::{Boundary, CompletionRequest, InvokeError, InvokeResult};

/// Provider settings, the `[provider]` table of config.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the API, without the `/responses` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Blocking client for the Responses endpoint.
pub struct OpenAiClient {
    config: ProviderConfig,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl OpenAiClient {
    /// Create a client. Without a key, calls go out unauthenticated and the
    /// provider's rejection is reported as [`InvokeError::Rejected`].
    pub fn new(config: ProviderConfig, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            config,
            api_key,
            agent,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.config.base_url.trim_end_matches('/'))
    }
}

impl Boundary for OpenAiClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> InvokeResult<String> {
        let url = self.endpoint();
        let body = request_body(request);

        let mut call = self.agent.post(&url).set("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            call = call.set("Authorization", &format!("Bearer {key}"));
        }

        match call.send_json(body) {
            Ok(resp) => {
                let text = resp.into_string().map_err(|e| InvokeError::MalformedResponse {
                    message: format!("failed to read body: {e}"),
                })?;
                parse_output(&text)
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(InvokeError::Rejected {
                    status,
                    message: provider_error_message(&body),
                })
            }
            Err(ureq::Error::Transport(t)) => Err(InvokeError::Unreachable {
                url,
                message: t.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("authenticated", &self.api_key.is_some())
            .finish()
    }
}

/// Build the JSON request body.
pub fn request_body(request: &CompletionRequest<'_>) -> serde_json::Value {
    let content: Vec<serde_json::Value> = request
        .content
        .iter()
        .map(|fragment| match fragment {
            PromptFragment::Text { text } => serde_json::json!({
                "type": "input_text",
                "text": text,
            }),
            PromptFragment::Document {
                filename,
                media_type,
                data,
            } => serde_json::json!({
                "type": "input_file",
                "filename": filename,
                "file_data": format!("data:{media_type};base64,{}", BASE64.encode(data)),
            }),
        })
        .collect();

    serde_json::json!({
        "model": request.model,
        "input": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": content },
        ],
    })
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Extract the completion text from a Responses API body.
pub fn parse_output(body: &str) -> InvokeResult<String> {
    let parsed: ResponsesBody =
        serde_json::from_str(body).map_err(|e| InvokeError::MalformedResponse {
            message: e.to_string(),
        })?;

    if let Some(text) = parsed.output_text {
        return Ok(text);
    }

    let texts: Vec<String> = parsed
        .output
        .into_iter()
        .flat_map(|item| item.content)
        .filter(|c| c.kind == "output_text")
        .filter_map(|c| c.text)
        .collect();

    if texts.is_empty() {
        return Err(InvokeError::MalformedResponse {
            message: "no output_text in response".into(),
        });
    }
    Ok(texts.concat())
}

/// Pull `error.message` out of a provider error body, falling back to the raw text.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty error body".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
