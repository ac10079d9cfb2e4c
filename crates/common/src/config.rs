use crate::error::CntubeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder value shipped in .env.example; treated the same as an unset key.
const PLACEHOLDER_API_KEY: &str = "your_openai_api_key_here";

/// Which chat/embedding backend performs the language analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisBackend {
    OpenAi,
    Ollama,
}

impl AnalysisBackend {
    fn from_env_value(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("ollama") => Self::Ollama,
            _ => Self::OpenAi,
        }
    }
}

/// CNtube application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Per-request working directory root
    pub temp_dir: PathBuf,

    /// Whisper model name or path
    pub whisper_model: String,

    /// Analysis backend selection
    pub analysis_backend: AnalysisBackend,

    /// OpenAI-compatible API key (None when unset or placeholder)
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL
    pub openai_base_url: String,

    /// OpenAI chat model name
    pub openai_model: String,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Ollama chat model name
    pub ollama_model: String,

    /// Embedding model name
    pub embedding_model: String,

    /// TOCFL word list path
    pub lexicon_path: PathBuf,

    /// Grammar corpus text path
    pub grammar_corpus_path: PathBuf,

    /// Grammar embedding index path
    pub grammar_index_path: PathBuf,

    /// Learner level used when a request omits one (1-7)
    pub default_user_level: u8,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            temp_dir: PathBuf::from("./temp"),
            whisper_model: "base".to_string(),
            analysis_backend: AnalysisBackend::OpenAi,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "qwen2.5:1.5b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            lexicon_path: PathBuf::from("./data/tocfl_words.json"),
            grammar_corpus_path: PathBuf::from("./data/grammar_corpus.txt"),
            grammar_index_path: PathBuf::from("./data/grammar_index.json"),
            default_user_level: 1,
            log_dir: PathBuf::from("./logs"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, CntubeError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let config = Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            temp_dir: Self::get_env_path("TEMP_DIR")
                .unwrap_or_else(|| PathBuf::from("./temp")),
            whisper_model: std::env::var("WHISPER_MODEL")
                .unwrap_or_else(|_| "base".to_string()),
            analysis_backend: AnalysisBackend::from_env_value(
                std::env::var("ANALYSIS_BACKEND").ok(),
            ),
            openai_api_key: Self::clean_api_key(std::env::var("OPENAI_API_KEY").ok()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: std::env::var("OLLAMA_MODEL")
                .unwrap_or_else(|_| "qwen2.5:1.5b".to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "nomic-embed-text".to_string()),
            lexicon_path: Self::get_env_path("LEXICON_PATH")
                .unwrap_or_else(|| PathBuf::from("./data/tocfl_words.json")),
            grammar_corpus_path: Self::get_env_path("GRAMMAR_CORPUS_PATH")
                .unwrap_or_else(|| PathBuf::from("./data/grammar_corpus.txt")),
            grammar_index_path: Self::get_env_path("GRAMMAR_INDEX_PATH")
                .unwrap_or_else(|| PathBuf::from("./data/grammar_index.json")),
            default_user_level: std::env::var("USER_LEVEL_DEFAULT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|l: u8| l.clamp(1, 7))
                .unwrap_or(1),
            log_dir: Self::get_env_path("LOG_DIR")
                .unwrap_or_else(|| PathBuf::from("./logs")),
            log_level: std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string()),
        };

        // Ensure required directories exist
        config.ensure_directories()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Drop empty or placeholder API keys so they read as "no credential"
    fn clean_api_key(raw: Option<String>) -> Option<String> {
        raw.filter(|key| !key.trim().is_empty() && key != PLACEHOLDER_API_KEY)
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), CntubeError> {
        let dirs = vec![&self.temp_dir, &self.log_dir];

        for dir in dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    CntubeError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Get working directory for a processing session
    pub fn get_session_dir(&self, session_id: &str) -> PathBuf {
        self.temp_dir.join(session_id)
    }

    /// Get log file path
    pub fn get_log_path(&self, filename: &str) -> PathBuf {
        self.log_dir.join(filename)
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// True when a real OpenAI credential is configured
    pub fn has_openai_credential(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), CntubeError> {
        // Validate Whisper model name
        if self.whisper_model.is_empty() {
            return Err(CntubeError::config("Whisper model name cannot be empty"));
        }

        // Validate backend URLs
        if !self.ollama_base_url.starts_with("http://")
            && !self.ollama_base_url.starts_with("https://") {
            return Err(CntubeError::config(
                "Ollama base URL must start with http:// or https://"
            ));
        }

        if !self.openai_base_url.starts_with("http://")
            && !self.openai_base_url.starts_with("https://") {
            return Err(CntubeError::config(
                "OpenAI base URL must start with http:// or https://"
            ));
        }

        // Validate port range
        if self.server_port == 0 {
            return Err(CntubeError::config("Server port cannot be 0"));
        }

        // Validate learner level range
        if !(1..=7).contains(&self.default_user_level) {
            return Err(CntubeError::config("Default user level must be 1-7"));
        }

        Ok(())
    }
}
