//! Language analyzer: vocabulary and grammar extraction for learners

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use cntube_common::{AnalysisBackend, AppConfig, Result};

use crate::chunking::chunk_text;
use crate::client::OllamaClient;
use crate::lexicon::{Lexicon, MAX_WORDS_PER_BAND};
use crate::llm_trait::LlmClient;
use crate::openai_client::OpenAiClient;
use crate::prompts;
use crate::types::{AnalysisResult, GrammarPoint, LeveledWords, VocabularyEntry};

/// Chunked analysis kicks in above this many characters
const CHUNK_THRESHOLD_CHARS: usize = 8000;

/// Chunk size for long transcripts
const CHUNK_SIZE_CHARS: usize = 2000;

/// Overlap between consecutive chunks
const CHUNK_OVERLAP_CHARS: usize = 100;

/// Note attached to placeholder results
const PLACEHOLDER_NOTE: &str =
    "This is placeholder analysis. Configure OPENAI_API_KEY for real LLM analysis.";

/// Build the configured LLM client
///
/// OpenAI needs a credential; without one the caller gets `None` and
/// analysis takes the placeholder path. Ollama needs none.
pub fn client_from_config(config: &AppConfig) -> Result<Option<Arc<dyn LlmClient>>> {
    match config.analysis_backend {
        AnalysisBackend::Ollama => {
            let client = OllamaClient::new(&config.ollama_base_url, &config.ollama_model)?;
            Ok(Some(Arc::new(client)))
        }
        AnalysisBackend::OpenAi => match &config.openai_api_key {
            Some(key) => {
                let client = OpenAiClient::new(&config.openai_base_url, key, &config.openai_model)?;
                Ok(Some(Arc::new(client)))
            }
            None => Ok(None),
        },
    }
}

/// Analyzes Traditional Chinese transcripts for vocabulary and grammar
pub struct LanguageAnalyzer {
    client: Option<Arc<dyn LlmClient>>,
    lexicon: Lexicon,
}

impl LanguageAnalyzer {
    /// Create a new analyzer
    ///
    /// `client` is `None` when no LLM backend is configured.
    pub fn new(client: Option<Arc<dyn LlmClient>>, lexicon: Lexicon) -> Self {
        Self { client, lexicon }
    }

    /// Whether a real LLM backend is available
    pub fn has_llm(&self) -> bool {
        self.client.is_some()
    }

    /// Analyze a transcript
    ///
    /// `grammar_context` carries rules retrieved from the grammar corpus and
    /// grounds the grammar prompt when present. LLM failures degrade to
    /// empty lists rather than failing the request.
    pub async fn analyze(&self, text: &str, grammar_context: Option<&str>) -> AnalysisResult {
        let leveled_words = self.lexicon.extract_leveled(text, MAX_WORDS_PER_BAND);

        let client = match &self.client {
            Some(client) => client,
            None => {
                info!("No LLM backend configured, returning placeholder analysis");
                return placeholder_analysis(leveled_words);
            }
        };

        let char_count = text.chars().count();
        let (mut vocabulary, grammar_points) = if char_count > CHUNK_THRESHOLD_CHARS {
            info!(
                "Transcript is long ({} chars), analyzing in chunks",
                char_count
            );
            self.analyze_chunked(client.as_ref(), text, grammar_context)
                .await
        } else {
            let vocabulary = self.extract_vocabulary(client.as_ref(), text).await;
            let grammar_points = self
                .extract_grammar_points(client.as_ref(), text, grammar_context)
                .await;
            (vocabulary, grammar_points)
        };

        // Annotate LLM vocabulary with official lexicon levels
        for entry in &mut vocabulary {
            if entry.level.is_none() {
                entry.level = self.lexicon.level_of(&entry.word);
            }
        }

        info!(
            "Analysis complete: {} vocabulary, {} grammar points, {} leveled words",
            vocabulary.len(),
            grammar_points.len(),
            leveled_words.total()
        );

        AnalysisResult {
            vocabulary,
            grammar_points,
            leveled_words,
            source: client.name().to_string(),
            note: None,
        }
    }

    /// Extract vocabulary, degrading to empty on failure
    async fn extract_vocabulary(&self, client: &dyn LlmClient, text: &str) -> Vec<VocabularyEntry> {
        let prompt = prompts::vocabulary_prompt(text);
        match client.chat(prompts::VOCABULARY_SYSTEM_PROMPT, &prompt).await {
            Ok(response) => match parse_json_array::<VocabularyEntry>(&response) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Failed to parse vocabulary response: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Vocabulary extraction failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Extract grammar points, degrading to empty on failure
    async fn extract_grammar_points(
        &self,
        client: &dyn LlmClient,
        text: &str,
        grammar_context: Option<&str>,
    ) -> Vec<GrammarPoint> {
        let prompt = prompts::grammar_prompt(text, grammar_context);
        match client.chat(prompts::GRAMMAR_SYSTEM_PROMPT, &prompt).await {
            Ok(response) => match parse_json_array::<GrammarPoint>(&response) {
                Ok(points) => points,
                Err(e) => {
                    warn!("Failed to parse grammar response: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Grammar extraction failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Analyze a long transcript chunk by chunk and merge the results
    ///
    /// Vocabulary entries are de-duplicated by word, grammar points by name.
    async fn analyze_chunked(
        &self,
        client: &dyn LlmClient,
        text: &str,
        grammar_context: Option<&str>,
    ) -> (Vec<VocabularyEntry>, Vec<GrammarPoint>) {
        let chunks = chunk_text(text, CHUNK_SIZE_CHARS, CHUNK_OVERLAP_CHARS);
        debug!("Split transcript into {} chunks", chunks.len());

        let mut vocabulary: Vec<VocabularyEntry> = Vec::new();
        let mut grammar_points: Vec<GrammarPoint> = Vec::new();
        let mut seen_words = HashSet::new();
        let mut seen_patterns = HashSet::new();

        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Analyzing chunk {}/{}", i + 1, chunks.len());

            for entry in self.extract_vocabulary(client, &chunk.text).await {
                if seen_words.insert(entry.word.clone()) {
                    vocabulary.push(entry);
                }
            }

            for point in self
                .extract_grammar_points(client, &chunk.text, grammar_context)
                .await
            {
                if seen_patterns.insert(point.name.clone()) {
                    grammar_points.push(point);
                }
            }
        }

        (vocabulary, grammar_points)
    }
}

/// Deterministic analysis used when no LLM backend is configured
fn placeholder_analysis(leveled_words: LeveledWords) -> AnalysisResult {
    let vocabulary = vec![
        VocabularyEntry {
            word: "學習".to_string(),
            pinyin: "xué xí".to_string(),
            english: "to learn, to study".to_string(),
            part_of_speech: "動詞".to_string(),
            example: "我每天學習中文。".to_string(),
            level: None,
        },
        VocabularyEntry {
            word: "影片".to_string(),
            pinyin: "yǐng piàn".to_string(),
            english: "video, film".to_string(),
            part_of_speech: "名詞".to_string(),
            example: "這部影片很有趣。".to_string(),
            level: None,
        },
        VocabularyEntry {
            word: "語言".to_string(),
            pinyin: "yǔ yán".to_string(),
            english: "language".to_string(),
            part_of_speech: "名詞".to_string(),
            example: "中文是一種美麗的語言。".to_string(),
            level: None,
        },
    ];

    let grammar_points = vec![
        GrammarPoint {
            name: "是...的 Structure".to_string(),
            explanation: "The 是...的 construction is used to emphasize time, place, manner, \
                          or purpose of a past action."
                .to_string(),
            structure: "Subject + 是 + Time/Place/Manner + Verb + 的".to_string(),
            example_from_text: "我是昨天來的。".to_string(),
            additional_examples: vec![
                "他是在北京學中文的。".to_string(),
                "這本書是我買的。".to_string(),
            ],
        },
        GrammarPoint {
            name: "了 Particle".to_string(),
            explanation: "The particle 了 indicates completed action or change of state."
                .to_string(),
            structure: "Verb + 了 (+ Object)".to_string(),
            example_from_text: "我看了這個影片。".to_string(),
            additional_examples: vec!["她吃了飯。".to_string(), "天氣變冷了。".to_string()],
        },
    ];

    AnalysisResult {
        vocabulary,
        grammar_points,
        leveled_words,
        source: "placeholder".to_string(),
        note: Some(PLACEHOLDER_NOTE.to_string()),
    }
}

/// Strip a markdown code fence wrapping an LLM response
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    match rest.strip_suffix("```") {
        Some(inner) => inner.trim(),
        None => rest.trim(),
    }
}

/// Parse a JSON array out of an LLM response
///
/// Ollama's JSON mode sometimes wraps the array in an object; in that case
/// the first array value inside the object is taken.
fn parse_json_array<T: serde::de::DeserializeOwned>(response: &str) -> anyhow::Result<Vec<T>> {
    let cleaned = strip_code_fence(response);

    if let Ok(items) = serde_json::from_str::<Vec<T>>(cleaned) {
        return Ok(items);
    }

    let value: serde_json::Value = serde_json::from_str(cleaned)?;
    if let Some(array) = value
        .as_object()
        .and_then(|obj| obj.values().find(|v| v.is_array()))
    {
        return Ok(serde_json::from_value(array.clone())?);
    }

    anyhow::bail!("Response is not a JSON array")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::path::Path;

    struct CannedClient {
        vocabulary: String,
        grammar: String,
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn chat(&self, system: &str, _user: &str) -> Result<String> {
            if system == prompts::VOCABULARY_SYSTEM_PROMPT {
                Ok(self.vocabulary.clone())
            } else {
                Ok(self.grammar.clone())
            }
        }

        async fn embed(&self, _model: &str, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }

        async fn test_connection(&self) -> Result<bool> {
            Ok(true)
        }
    }

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
            Err(cntube_common::CntubeError::analysis("backend down"))
        }

        async fn embed(&self, _model: &str, _text: &str) -> Result<Vec<f32>> {
            Err(cntube_common::CntubeError::analysis("backend down"))
        }

        async fn test_connection(&self) -> Result<bool> {
            Ok(false)
        }
    }

    fn lexicon_with_xuexi() -> Lexicon {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(r#"{"學習": {"pinyin": "xué xí", "definition": "to learn", "level": 1}}"#.as_bytes())
            .unwrap();
        Lexicon::load(&path).unwrap()
    }

    #[tokio::test]
    async fn test_placeholder_without_client() {
        let analyzer = LanguageAnalyzer::new(None, Lexicon::load_or_empty(Path::new("/nonexistent")));
        let result = analyzer.analyze("我每天學習中文。", None).await;

        assert_eq!(result.source, "placeholder");
        assert!(result.note.is_some());
        assert_eq!(result.vocabulary.len(), 3);
        assert_eq!(result.vocabulary[0].word, "學習");
        assert_eq!(result.grammar_points.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_parses_llm_output() {
        let client = CannedClient {
            vocabulary: r#"[{"word": "影片", "pinyin": "yǐng piàn", "english": "video", "part_of_speech": "名詞", "example": "這部影片很有趣。"}]"#.to_string(),
            grammar: r#"[{"name": "了 Particle", "explanation": "Completed action.", "structure": "Verb + 了", "example_from_text": "我看了。", "additional_examples": []}]"#.to_string(),
        };
        let analyzer = LanguageAnalyzer::new(
            Some(Arc::new(client)),
            Lexicon::load_or_empty(Path::new("/nonexistent")),
        );
        let result = analyzer.analyze("我看了這部影片。", None).await;

        assert_eq!(result.source, "canned");
        assert!(result.note.is_none());
        assert_eq!(result.vocabulary.len(), 1);
        assert_eq!(result.vocabulary[0].word, "影片");
        assert_eq!(result.grammar_points[0].name, "了 Particle");
    }

    #[tokio::test]
    async fn test_vocabulary_annotated_with_lexicon_level() {
        let client = CannedClient {
            vocabulary: r#"[{"word": "學習", "pinyin": "xué xí", "english": "to study"}]"#
                .to_string(),
            grammar: "[]".to_string(),
        };
        let analyzer = LanguageAnalyzer::new(Some(Arc::new(client)), lexicon_with_xuexi());
        let result = analyzer.analyze("我學習中文。", None).await;

        assert_eq!(result.vocabulary[0].level, Some(1));
    }

    #[tokio::test]
    async fn test_failing_client_degrades_to_empty() {
        let analyzer = LanguageAnalyzer::new(
            Some(Arc::new(FailingClient)),
            Lexicon::load_or_empty(Path::new("/nonexistent")),
        );
        let result = analyzer.analyze("我每天學習中文。", None).await;

        assert_eq!(result.source, "failing");
        assert!(result.vocabulary.is_empty());
        assert!(result.grammar_points.is_empty());
        assert!(result.note.is_none());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("[1]"), "[1]");
    }

    #[test]
    fn test_parse_json_array_plain() {
        let parsed: Vec<VocabularyEntry> = parse_json_array(r#"[{"word": "你好"}]"#).unwrap();
        assert_eq!(parsed[0].word, "你好");
    }

    #[test]
    fn test_parse_json_array_fenced() {
        let parsed: Vec<VocabularyEntry> =
            parse_json_array("```json\n[{\"word\": \"你好\"}]\n```").unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_parse_json_array_wrapped_in_object() {
        let parsed: Vec<VocabularyEntry> =
            parse_json_array(r#"{"vocabulary": [{"word": "你好"}]}"#).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_parse_json_array_rejects_garbage() {
        assert!(parse_json_array::<VocabularyEntry>("not json").is_err());
    }
}
