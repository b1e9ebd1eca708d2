use async_trait::async_trait;

use crate::error::{AnalysisError, Result};

/// Capability seam for the model call. The analyzer depends on this trait,
/// never on a concrete HTTP client, so tests can script responses.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;
}

#[derive(Clone, Debug, Default)]
pub enum Provider {
    #[default]
    Grok,
    Openai,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-3-pro",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Grok => "Grok",
            Provider::Openai => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| AnalysisError::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }
}

/// Text generation over an OpenAI-compatible chat-completions endpoint.
pub struct HttpGenerator {
    provider: Provider,
    api_key: String,
    client: reqwest::Client,
}

impl HttpGenerator {
    /// Fails fast when the provider's API key is not set.
    pub fn new(provider: Provider) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        Ok(Self {
            provider,
            api_key,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let config = self.provider.config();
        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": temperature,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("context_length") || body.contains("maximum context") {
                return Err(AnalysisError::ContextOverflow { reason: body });
            }
            return Err(AnalysisError::InvalidResponse {
                reason: format!("{} returned {}: {}", self.provider.name(), status, body),
            });
        }

        let payload = response.json::<serde_json::Value>().await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AnalysisError::InvalidResponse {
                reason: format!("missing message content in: {:?}", payload),
            })?;

        Ok(content.to_string())
    }
}
