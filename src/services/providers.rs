// Language Model Provider Service
// HTTP calls to the extraction model: Ollama generate API and OpenAI-compatible chat completions

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::config_store::ConfigStore;

pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434/api/generate";
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_DEFAULT_URL: &str = "https://api.deepseek.com/chat/completions";
const GLM_DEFAULT_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const CLIENT_TIMEOUT_SECS: u64 = 300;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured for provider {0}")]
    MissingApiKey(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub model: String,
}

/// Parse `name[:model]`; an absent model is left empty
pub fn parse_provider(spec: &str) -> ProviderSpec {
    let parts: Vec<&str> = spec.trim().splitn(2, ':').collect();
    if parts.len() == 2 {
        ProviderSpec {
            name: parts[0].to_lowercase(),
            model: parts[1].to_string(),
        }
    } else {
        ProviderSpec {
            name: spec.trim().to_lowercase(),
            model: String::new(),
        }
    }
}

pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4o-mini",
        "deepseek" => "deepseek-chat",
        "glm" => "glm-4-flash",
        _ => OLLAMA_DEFAULT_MODEL,
    }
}

pub fn default_url(provider: &str) -> &'static str {
    match provider {
        "openai" => OPENAI_CHAT_URL,
        "deepseek" => DEEPSEEK_DEFAULT_URL,
        "glm" => GLM_DEFAULT_URL,
        _ => OLLAMA_DEFAULT_URL,
    }
}

/// Sampling options shared by both request shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub context_tokens: u32,
    pub max_tokens: i32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.05,
            top_p: 0.9,
            context_tokens: 8192,
            max_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
    reasoning_content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaOptions {
    temperature: f64,
    top_p: f64,
    num_ctx: u32,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
}

fn json_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("json object regex"))
}

pub struct ProviderClient {
    client: Client,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub fn with_proxy(proxy_url: &str) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .proxy(proxy)
            .build()?;
        Ok(Self { client })
    }

    /// Single non-streaming completion from an Ollama server
    pub async fn call_ollama(
        &self,
        url: &str,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<ChatResult, ProviderError> {
        let request = OllamaRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                num_ctx: options.context_tokens,
            },
        };

        let start = Instant::now();
        let response = self.client.post(url).json(&request).send().await?;
        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data.response.ok_or(ProviderError::MissingContent)?;
        Ok(ChatResult { content, latency_ms })
    }

    /// OpenAI-compatible chat completion (OpenAI, DeepSeek, GLM)
    #[allow(clippy::too_many_arguments)]
    pub async fn call_chat(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        system: &str,
        user: &str,
        options: &GenerationOptions,
        use_json_format: bool,
    ) -> Result<ChatResult, ProviderError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: use_json_format.then(|| ResponseFormat {
                r#type: "json_object".to_string(),
            }),
        };

        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let message = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message);

        // Reasoning models sometimes leave content empty and put the JSON in the trace
        let content = message.and_then(|m| {
            m.content.filter(|c| !c.trim().is_empty()).or_else(|| {
                m.reasoning_content
                    .as_deref()
                    .and_then(|r| json_object_re().find(r))
                    .map(|found| found.as_str().to_string())
            })
        });

        let content = content.ok_or(ProviderError::MissingContent)?;
        Ok(ChatResult { content, latency_ms })
    }
}

/// Get API key from environment or config file
pub fn get_api_key(provider: &str) -> Option<String> {
    let env_keys: &[&str] = match provider {
        "openai" => &["OPENAI_API_KEY", "POLICY_DECODER_OPENAI_API_KEY"],
        "deepseek" => &["DEEPSEEK_API_KEY", "POLICY_DECODER_DEEPSEEK_API_KEY"],
        "glm" => &["GLM_API_KEY", "POLICY_DECODER_GLM_API_KEY"],
        _ => &[],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    let store = ConfigStore::from_env_or_default()?;
    store.get_api_key(provider).ok().flatten()
}
