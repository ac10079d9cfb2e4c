use async_trait::async_trait;
use cntube_common::{CntubeError, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::llm_trait::{with_retry, LlmClient};
use crate::types::{
    ChatMessage, OpenAiChatRequest, OpenAiChatResponse, OpenAiEmbedRequest, OpenAiEmbedResponse,
};

/// Sampling temperature for analysis calls
const ANALYSIS_TEMPERATURE: f32 = 0.7;

/// Token cap per extraction call
const MAX_COMPLETION_TOKENS: u32 = 2000;

/// OpenAI-compatible API client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let model = model.into();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // LLM calls can be slow
            .build()
            .map_err(|e| CntubeError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("OpenAI client initialized: {} (model: {})", base_url, model);
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            model,
            client,
        })
    }

    async fn chat_once(&self, request: &OpenAiChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CntubeError::network(format!("Failed to reach OpenAI: {}", e)))?
            .error_for_status()
            .map_err(|e| CntubeError::analysis(format!("OpenAI API error: {}", e)))?;

        let result: OpenAiChatResponse = response
            .json()
            .await
            .map_err(|e| CntubeError::analysis(format!("Unparseable OpenAI response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CntubeError::analysis("Empty response from OpenAI"));
        }

        Ok(content)
    }

    async fn embed_once(&self, request: &OpenAiEmbedRequest) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CntubeError::network(format!("Failed to reach OpenAI: {}", e)))?
            .error_for_status()
            .map_err(|e| CntubeError::analysis(format!("OpenAI embedding error: {}", e)))?;

        let result: OpenAiEmbedResponse = response.json().await.map_err(|e| {
            CntubeError::analysis(format!("Unparseable OpenAI embedding response: {}", e))
        })?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .unwrap_or_default();

        if embedding.is_empty() {
            return Err(CntubeError::analysis("Empty embedding from OpenAI"));
        }

        Ok(embedding)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = OpenAiChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(ANALYSIS_TEMPERATURE),
            max_tokens: Some(MAX_COMPLETION_TOKENS),
        };

        debug!(
            "OpenAI chat: model={}, prompt {} chars",
            request.model,
            user.chars().count()
        );

        with_retry("OpenAI chat", || self.chat_once(&request)).await
    }

    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let request = OpenAiEmbedRequest {
            model: model.to_string(),
            input: text.to_string(),
        };

        with_retry("OpenAI embedding", || self.embed_once(&request)).await
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| CntubeError::network(format!("Failed to reach OpenAI: {}", e)))?;
        Ok(response.status().is_success())
    }
}
