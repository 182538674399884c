// Extraction Oracle
// Prompt construction and the language-model backend that turns policy clauses into JSON

use std::future::Future;
use tracing::{debug, info};

use crate::services::config_store::{OracleConfig, ProxyConfig};
use crate::services::providers::{
    default_model, default_url, get_api_key, parse_provider, GenerationOptions, ProviderClient,
    ProviderError, ProviderSpec,
};

/// Anything that answers an extraction prompt with raw text.
///
/// The decoder makes no assumption about latency or ordering; a call either
/// returns text or fails.
pub trait ExtractionOracle: Send + Sync {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

const SYSTEM_PROMPT: &str = "You are a strict Indian health insurance policy analyzer. Respond with JSON only.";

const EXTRACTION_PROMPT: &str = r#"You are a strict Indian health insurance policy analyzer.

TASK: Extract ONLY information explicitly present in the policy clauses below.
These clauses have already been pre-filtered from a full policy document to contain
only the sections relevant to exclusions, waiting periods, co-payments, and limits.

RULES:
- Extract ONLY what is explicitly written. Do NOT invent or infer.
- Return empty lists [] when a category has no matches in the text.
- DO NOT mention suicide, self-harm, or mental health unless explicitly written.
- Every item must be traceable to an actual sentence in the text.
- Lines containing only "---" separate clauses that are not adjacent in the document.

RISK SCORE GUIDE (0-100):
  0-30  : Few exclusions, short waiting periods, low co-pay; policy is claimant-friendly
  31-60 : Moderate exclusions or waiting periods; some financial exposure
  61-80 : Many exclusions, long waiting periods, or high co-pay; significant risk
  81-100: Extensive exclusions, multiple co-pays, very long waiting periods; high rejection risk

OUTPUT: Respond with ONLY a valid JSON object. No preamble, no explanation, no markdown fences.

{
  "risk_score": <integer 0-100>,
  "waiting_periods": [
    {"condition": "<name>", "duration": "<e.g. 2 years>", "impact": "<plain English consequence>"}
  ],
  "exclusions": [
    {"item": "<excluded item>", "impact": "<what the policyholder must pay themselves>"}
  ],
  "co_payment": [
    {"percentage": "<e.g. 20%>", "condition": "<when it applies>", "impact": "<cost consequence>"}
  ],
  "hidden_limits": [
    {"limit": "<description>", "applies_to": "<treatment or scenario>", "impact": "<consequence>"}
  ],
  "danger_alerts": [
    {"severity": "<Critical|High|Medium>", "message": "<plain language warning>"}
  ]
}

Policy Clauses:
"#;

pub fn build_extraction_prompt(clauses: &str) -> String {
    let mut prompt = String::with_capacity(EXTRACTION_PROMPT.len() + clauses.len() + 1);
    prompt.push_str(EXTRACTION_PROMPT);
    prompt.push_str(clauses);
    prompt.push('\n');
    prompt
}

/// Oracle backed by a local Ollama server or an OpenAI-compatible chat API
pub struct LlmOracle {
    client: ProviderClient,
    provider: ProviderSpec,
    url: String,
    api_key: Option<String>,
    options: GenerationOptions,
}

impl LlmOracle {
    pub fn from_config(config: &OracleConfig, proxy: Option<&ProxyConfig>) -> Result<Self, ProviderError> {
        let mut provider = parse_provider(&config.provider);
        if provider.model.is_empty() {
            provider.model = default_model(&provider.name).to_string();
        }

        let url = config
            .base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| default_url(&provider.name).to_string());

        let api_key = if provider.name == "ollama" {
            None
        } else {
            Some(get_api_key(&provider.name).ok_or_else(|| ProviderError::MissingApiKey(provider.name.clone()))?)
        };

        let client = match proxy.and_then(ProxyConfig::active_url) {
            Some(proxy_url) => {
                debug!("[oracle] Using proxy {}", proxy_url);
                ProviderClient::with_proxy(proxy_url)?
            }
            None => ProviderClient::new(),
        };

        info!(
            "[oracle] Provider {}:{} at {}",
            provider.name, provider.model, url
        );

        Ok(Self {
            client,
            provider,
            url,
            api_key,
            options: GenerationOptions {
                temperature: config.temperature,
                context_tokens: config.context_tokens,
                ..GenerationOptions::default()
            },
        })
    }

    pub fn provider(&self) -> &ProviderSpec {
        &self.provider
    }
}

impl ExtractionOracle for LlmOracle {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let result = match &self.api_key {
            None => {
                self.client
                    .call_ollama(&self.url, &self.provider.model, prompt, &self.options)
                    .await?
            }
            Some(key) => {
                self.client
                    .call_chat(
                        &self.url,
                        &self.provider.model,
                        key,
                        SYSTEM_PROMPT,
                        prompt,
                        &self.options,
                        true,
                    )
                    .await?
            }
        };

        debug!(
            "[oracle] {} responded in {}ms ({} chars)",
            self.provider.name,
            result.latency_ms,
            result.content.len()
        );
        Ok(result.content)
    }
}
