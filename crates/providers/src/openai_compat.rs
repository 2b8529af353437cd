//! OpenAI-compatible endpoint client.
//!
//! Works with: Ollama, vLLM, OpenAI, OpenRouter, Together AI, and any
//! endpoint exposing `/v1/chat/completions` and `/v1/embeddings`.
//!
//! The generation boundary is three strings (persona, injected context,
//! user message); the persona rides as the system message and the context
//! block, when non-empty, as a second system message ahead of the user
//! turn. The client also exposes a `warmup()` heartbeat that sends a
//! minimal completion to force the endpoint to load model weights before
//! the interactive loop starts.

use async_trait::async_trait;
use serde::Deserialize;
use strata_core::error::{InferenceError, StoreError};
use strata_core::inference::InferenceService;
use strata_core::store::Embedder;
use tracing::{debug, info, warn};

/// A client for OpenAI-compatible inference endpoints.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    embed_model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new client.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            embed_model: String::new(),
            temperature: 0.7,
            max_tokens: 512,
            client,
        }
    }

    /// Create an Ollama client (convenience constructor).
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
            model,
        )
    }

    /// Set the embedding model used by the `Embedder` implementation.
    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per generated reply.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Heartbeat warm-up: send a minimal completion so the endpoint loads
    /// model weights before the first real turn.
    pub async fn warmup(&self) -> Result<(), InferenceError> {
        info!(model = %self.model, "Warming up inference endpoint");
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": ""}],
            "max_tokens": 1,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 200 {
            info!("Inference endpoint ready");
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(InferenceError::ApiError {
                status_code: status,
                message,
            })
        }
    }

    fn check_status(status: u16, body: String) -> Result<String, InferenceError> {
        match status {
            200 => Ok(body),
            429 => Err(InferenceError::RateLimited {
                retry_after_secs: 5,
            }),
            401 | 403 => Err(InferenceError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            )),
            _ => {
                warn!(status, body = %body, "Endpoint returned error");
                Err(InferenceError::ApiError {
                    status_code: status,
                    message: body,
                })
            }
        }
    }
}

#[async_trait]
impl InferenceService for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        persona: &str,
        context: &str,
        user: &str,
    ) -> Result<String, InferenceError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = vec![serde_json::json!({"role": "system", "content": persona})];
        if !context.is_empty() {
            messages.push(serde_json::json!({"role": "system", "content": context}));
        }
        messages.push(serde_json::json!({"role": "user", "content": user}));

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        });

        debug!(endpoint = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let text = Self::check_status(status, text)?;

        let api_response: ChatResponse =
            serde_json::from_str(&text).map_err(|e| InferenceError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let reply = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(InferenceError::EmptyResponse);
        }

        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl Embedder for OpenAiCompatClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.embed_model,
            "input": [text],
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::EmbeddingFailed(format!("network: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::EmbeddingFailed(format!(
                "status {status}: {message}"
            )));
        }

        let api_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| StoreError::EmbeddingFailed(format!("parse: {e}")))?;

        api_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| StoreError::EmbeddingFailed("no embedding in response".into()))
    }
}

// ── API wire types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
