use std::sync::Arc;

use tracing::{info, warn};

use cntube_analysis::{client_from_config, LanguageAnalyzer, Lexicon};
use cntube_common::{AppConfig, ModelManager, Result};
use cntube_grammar::GrammarSearchEngine;
use cntube_stt::WhisperEngine;

/// Shared application state
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Whisper engine, shared across requests
    pub engine: Arc<WhisperEngine>,

    /// Language analyzer
    pub analyzer: Arc<LanguageAnalyzer>,

    /// Grammar retrieval, present when a backend and corpus are available
    pub grammar: Option<Arc<GrammarSearchEngine>>,
}

impl AppState {
    /// Initialize all engines
    ///
    /// Resolves the whisper model (downloading it on first use), builds the
    /// LLM client for the configured backend, and loads or builds the
    /// grammar index. Grammar retrieval and the lexicon are best-effort;
    /// the whisper engine is required.
    pub async fn initialize(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let manager = ModelManager::new(ModelManager::default_models_dir())?;
        let model_path = manager.ensure_whisper_model(&config.whisper_model).await?;

        let engine = Arc::new(WhisperEngine::new(&model_path)?);
        info!(
            "Whisper engine ready - model {} on {:?}",
            engine.model_path(),
            engine.gpu_device()
        );

        let client = client_from_config(&config)?;
        match &client {
            Some(client) => info!("Analysis backend: {}", client.name()),
            None => warn!("No LLM credential configured - analysis will use the placeholder"),
        }

        let grammar = match &client {
            Some(client) => {
                let built = GrammarSearchEngine::load_or_build(
                    &config.grammar_corpus_path,
                    &config.grammar_index_path,
                    client.clone(),
                    &config.embedding_model,
                )
                .await;

                match built {
                    Ok(engine) => {
                        info!("Grammar retrieval ready - {} rules", engine.len());
                        Some(Arc::new(engine))
                    }
                    Err(e) => {
                        warn!("Grammar retrieval unavailable: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let lexicon = Lexicon::load_or_empty(&config.lexicon_path);
        let analyzer = Arc::new(LanguageAnalyzer::new(client, lexicon));

        Ok(Self {
            config,
            engine,
            analyzer,
            grammar,
        })
    }
}
