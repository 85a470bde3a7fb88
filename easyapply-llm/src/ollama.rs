use crate::traits::{LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use easyapply_common::{EasyApplyError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    eval_count: Option<u32>,
}

/// Ollama client for local model inference.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a new client and verify server/model availability.
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| EasyApplyError::Agent(format!("Failed to create HTTP client: {}", e)))?;

        let ollama_client = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        };

        let models = ollama_client.fetch_available_models().await?;
        if !models.iter().any(|m| m == &ollama_client.model) {
            tracing::info!("Model {} not found locally, pulling...", ollama_client.model);
            ollama_client.pull_model().await?;
        }

        Ok(ollama_client)
    }

    async fn fetch_available_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| EasyApplyError::Agent(OLLAMA_CONNECTION_ERROR.to_string()))?;

        if !resp.status().is_success() {
            return Err(EasyApplyError::Agent(OLLAMA_CONNECTION_ERROR.to_string()));
        }

        let tags: TagsResponse = resp.json().await.map_err(LlmError::Network)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull_model(&self) -> Result<()> {
        let url = format!("{}/api/pull", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "model": self.model, "stream": false }))
            .send()
            .await
            .map_err(LlmError::Network)?;

        if resp.status().is_success() {
            tracing::info!("Successfully pulled model: {}", self.model);
            Ok(())
        } else {
            Err(LlmError::Api {
                status: resp.status().as_u16(),
                message: format!("failed to pull model {}", self.model),
            }
            .into())
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.base_url);

        let payload = GenerateRequest {
            model: &self.model,
            prompt: prompt.to_string(),
            system: system_prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(LlmError::Network)?;

        if !resp.status().is_success() {
            return Err(LlmError::Api {
                status: resp.status().as_u16(),
                message: "generate failed".to_string(),
            }
            .into());
        }

        let body: GenerateResponse = resp.json().await.map_err(LlmError::Network)?;

        Ok(LlmResponse {
            text: body.response,
            model: Some(self.model.clone()),
            tokens_used: body.eval_count,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        self.fetch_available_models().await.map(|_| true).or(Ok(false))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
