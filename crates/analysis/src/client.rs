use async_trait::async_trait;
use cntube_common::{CntubeError, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::llm_trait::{with_retry, LlmClient};
use crate::types::{
    ChatMessage, ChatOptions, ChatRequest, ChatResponse, EmbedRequest, EmbedResponse,
};

/// Sampling temperature for analysis calls
const ANALYSIS_TEMPERATURE: f32 = 0.7;

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let model = model.into();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // LLM calls can be slow
            .build()
            .map_err(|e| CntubeError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {} (model: {})", base_url, model);
        Ok(Self {
            base_url,
            model,
            client,
        })
    }

    async fn chat_once(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CntubeError::network(format!("Failed to reach Ollama: {}", e)))?
            .error_for_status()
            .map_err(|e| CntubeError::analysis(format!("Ollama API error: {}", e)))?;

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| CntubeError::analysis(format!("Unparseable Ollama response: {}", e)))?;

        if result.message.content.is_empty() {
            return Err(CntubeError::analysis("Empty response from Ollama"));
        }

        Ok(result.message.content)
    }

    async fn embed_once(&self, request: &EmbedRequest) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CntubeError::network(format!("Failed to reach Ollama: {}", e)))?
            .error_for_status()
            .map_err(|e| CntubeError::analysis(format!("Ollama embedding error: {}", e)))?;

        let result: EmbedResponse = response.json().await.map_err(|e| {
            CntubeError::analysis(format!("Unparseable Ollama embedding response: {}", e))
        })?;

        if result.embedding.is_empty() {
            return Err(CntubeError::analysis("Empty embedding from Ollama"));
        }

        Ok(result.embedding)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            stream: Some(false),
            // JSON mode keeps small local models parseable
            format: Some("json".to_string()),
            options: Some(ChatOptions {
                temperature: Some(ANALYSIS_TEMPERATURE),
                ..Default::default()
            }),
        };

        debug!(
            "Ollama chat: model={}, prompt {} chars",
            request.model,
            user.chars().count()
        );

        with_retry("Ollama chat", || self.chat_once(&request)).await
    }

    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        with_retry("Ollama embedding", || self.embed_once(&request)).await
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CntubeError::network(format!("Failed to reach Ollama: {}", e)))?;
        Ok(response.status().is_success())
    }
}
