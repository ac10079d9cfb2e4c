use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use cntube_analysis::LlmClient;
use cntube_common::Result;

use crate::corpus;
use crate::similarity::cosine_similarity;
use crate::types::{GrammarIndex, GrammarRule, IndexedRule, SearchHit};

/// Rules retrieved per query
pub const RETRIEVAL_TOP_K: usize = 5;

/// Grammar rule search engine
///
/// The index is immutable after construction; share it behind `Arc`.
pub struct GrammarSearchEngine {
    index: GrammarIndex,
    client: Arc<dyn LlmClient>,
    embedding_model: String,
}

impl GrammarSearchEngine {
    /// Load the persisted index, or build it from the corpus and save it
    ///
    /// A saved index is reused only when it was built with the same
    /// embedding model; a stale or unreadable index is rebuilt.
    pub async fn load_or_build(
        corpus_path: &Path,
        index_path: &Path,
        client: Arc<dyn LlmClient>,
        embedding_model: &str,
    ) -> Result<Self> {
        if index_path.exists() {
            match Self::load_index(index_path).await {
                Ok(index) if index.embedding_model == embedding_model => {
                    info!(
                        "Loaded grammar index from {} - {} entries",
                        index_path.display(),
                        index.count()
                    );
                    return Ok(Self {
                        index,
                        client,
                        embedding_model: embedding_model.to_string(),
                    });
                }
                Ok(index) => {
                    warn!(
                        "Grammar index was built with model {}, rebuilding with {}",
                        index.embedding_model, embedding_model
                    );
                }
                Err(e) => {
                    warn!("Failed to load grammar index: {}. Rebuilding...", e);
                }
            }
        }

        let rules = corpus::load_corpus(corpus_path)?;
        let index = Self::build_index(rules, client.as_ref(), embedding_model).await?;

        if let Err(e) = Self::save_index(&index, index_path).await {
            warn!(
                "Failed to save grammar index to {}: {}",
                index_path.display(),
                e
            );
        }

        Ok(Self {
            index,
            client,
            embedding_model: embedding_model.to_string(),
        })
    }

    /// Embed every rule
    async fn build_index(
        rules: Vec<GrammarRule>,
        client: &dyn LlmClient,
        embedding_model: &str,
    ) -> Result<GrammarIndex> {
        let total = rules.len();
        info!("Building grammar index - embedding {} rules", total);

        let mut index = GrammarIndex::new(embedding_model);
        for (i, rule) in rules.into_iter().enumerate() {
            let embedding = client.embed(embedding_model, &rule.text).await?;
            index.entries.push(IndexedRule {
                text: rule.text,
                level: rule.level,
                embedding,
            });

            if (i + 1) % 50 == 0 {
                debug!("Embedded {}/{} rules", i + 1, total);
            }
        }

        info!("Grammar index built - {} entries", index.count());
        Ok(index)
    }

    /// Load index from file
    async fn load_index(path: &Path) -> Result<GrammarIndex> {
        let data = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save index to file
    ///
    /// Writes to a temp file first so a crash never leaves a truncated
    /// index behind.
    async fn save_index(index: &GrammarIndex, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_string(index)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, path).await?;

        info!("Saved grammar index to {}", path.display());
        Ok(())
    }

    /// Retrieve the rules closest to the query at the learner's level
    pub async fn search(&self, query: &str, level: u8, top_k: usize) -> Result<Vec<SearchHit>> {
        debug!("Searching grammar rules at level {} (top_k={})", level, top_k);

        let query_embedding = self.client.embed(&self.embedding_model, query).await?;

        let mut hits: Vec<SearchHit> = self
            .index
            .entries
            .iter()
            .filter(|entry| entry.level == Some(level))
            .map(|entry| SearchHit {
                text: entry.text.clone(),
                level: entry.level,
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        // Sort by score (descending)
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(top_k);

        debug!("Retrieved {} grammar rules", hits.len());
        Ok(hits)
    }

    /// Best-effort retrieval context for the grammar prompt
    ///
    /// Failures are logged and produce `None`; analysis proceeds without
    /// retrieved rules.
    pub async fn retrieve_context(&self, query: &str, level: u8) -> Option<String> {
        match self.search(query, level, RETRIEVAL_TOP_K).await {
            Ok(hits) if !hits.is_empty() => Some(
                hits.iter()
                    .map(|hit| hit.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            ),
            Ok(_) => {
                debug!("No grammar rules indexed at level {}", level);
                None
            }
            Err(e) => {
                warn!("Grammar retrieval failed: {}", e);
                None
            }
        }
    }

    /// Number of indexed rules
    pub fn len(&self) -> usize {
        self.index.count()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embeddings: identical text embeds to identical vectors
    struct HashingClient {
        embeds: AtomicUsize,
    }

    impl HashingClient {
        fn new() -> Self {
            Self {
                embeds: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmClient for HashingClient {
        fn name(&self) -> &'static str {
            "hashing"
        }

        async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
            Ok("{}".to_string())
        }

        async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>> {
            self.embeds.fetch_add(1, Ordering::SeqCst);
            let sum: f32 = text.bytes().map(|b| b as f32).sum();
            Ok(vec![sum, text.len() as f32, 1.0])
        }

        async fn test_connection(&self) -> Result<bool> {
            Ok(true)
        }
    }

    const CORPUS: &str = "基礎 第1級\n是...的：強調時間、地點、方式。\n//\n基礎 第1級\n了：表示動作完成。\n//\n進階 第5級\n把字句：處置式結構。";

    fn write_corpus(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("grammar_corpus.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(CORPUS.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_build_and_search_filters_by_level() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = write_corpus(dir.path());
        let index_path = dir.path().join("grammar_index.json");

        let engine = GrammarSearchEngine::load_or_build(
            &corpus_path,
            &index_path,
            Arc::new(HashingClient::new()),
            "test-embed",
        )
        .await
        .unwrap();

        assert_eq!(engine.len(), 3);
        assert!(index_path.exists());

        let hits = engine.search("是...的", 1, 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| hit.level == Some(1)));

        let hits = engine.search("把字句", 3, 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_saved_index_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = write_corpus(dir.path());
        let index_path = dir.path().join("grammar_index.json");

        let client = Arc::new(HashingClient::new());
        GrammarSearchEngine::load_or_build(&corpus_path, &index_path, client.clone(), "test-embed")
            .await
            .unwrap();
        let builds = client.embeds.load(Ordering::SeqCst);
        assert_eq!(builds, 3);

        // Second construction loads the saved index without re-embedding
        GrammarSearchEngine::load_or_build(&corpus_path, &index_path, client.clone(), "test-embed")
            .await
            .unwrap();
        assert_eq!(client.embeds.load(Ordering::SeqCst), builds);
    }

    #[tokio::test]
    async fn test_model_mismatch_triggers_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = write_corpus(dir.path());
        let index_path = dir.path().join("grammar_index.json");

        let client = Arc::new(HashingClient::new());
        GrammarSearchEngine::load_or_build(&corpus_path, &index_path, client.clone(), "model-a")
            .await
            .unwrap();

        let engine =
            GrammarSearchEngine::load_or_build(&corpus_path, &index_path, client.clone(), "model-b")
                .await
                .unwrap();
        assert_eq!(engine.len(), 3);
        assert_eq!(client.embeds.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_retrieve_context_joins_rules() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = write_corpus(dir.path());
        let index_path = dir.path().join("grammar_index.json");

        let engine = GrammarSearchEngine::load_or_build(
            &corpus_path,
            &index_path,
            Arc::new(HashingClient::new()),
            "test-embed",
        )
        .await
        .unwrap();

        let context = engine.retrieve_context("完成", 1).await.unwrap();
        assert!(context.contains("了：表示動作完成。"));

        assert!(engine.retrieve_context("任何", 7).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_corpus_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = GrammarSearchEngine::load_or_build(
            &dir.path().join("missing.txt"),
            &dir.path().join("grammar_index.json"),
            Arc::new(HashingClient::new()),
            "test-embed",
        )
        .await;
        assert!(result.is_err());
    }
}
