use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Analysis results
// ---------------------------------------------------------------------------

/// One vocabulary item surfaced by the analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyEntry {
    /// The word (Traditional Chinese)
    pub word: String,

    /// Hanyu pinyin
    #[serde(default)]
    pub pinyin: String,

    /// English translation
    #[serde(default)]
    pub english: String,

    /// Part of speech (名詞, 動詞, ...)
    #[serde(default)]
    pub part_of_speech: String,

    /// Example sentence using the word
    #[serde(default)]
    pub example: String,

    /// TOCFL level when the word is in the lexicon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

/// One grammar point surfaced by the analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarPoint {
    /// Pattern name (e.g., 把字句)
    pub name: String,

    /// English explanation of the pattern
    #[serde(default)]
    pub explanation: String,

    /// Structure formula (e.g., Subject + 把 + Object + Verb)
    #[serde(default)]
    pub structure: String,

    /// Example taken from the transcript
    #[serde(default)]
    pub example_from_text: String,

    /// Additional example sentences
    #[serde(default)]
    pub additional_examples: Vec<String>,
}

/// A lexicon word found in the transcript, with its difficulty level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeveledWord {
    /// The word (Traditional Chinese)
    pub word: String,

    /// Hanyu pinyin
    #[serde(default)]
    pub pinyin: String,

    /// Zhuyin (bopomofo)
    #[serde(default)]
    pub zhuyin: String,

    /// English definition from the lexicon
    #[serde(default)]
    pub definition: String,

    /// TOCFL level (1-7)
    pub level: u8,

    /// Occurrences in the transcript
    pub count: usize,
}

/// Lexicon words grouped by difficulty band
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeveledWords {
    /// Levels 1-2
    pub foundational: Vec<LeveledWord>,

    /// Levels 3-4
    pub intermediate: Vec<LeveledWord>,

    /// Levels 5+
    pub advanced: Vec<LeveledWord>,
}

impl LeveledWords {
    /// Total words across all bands
    pub fn total(&self) -> usize {
        self.foundational.len() + self.intermediate.len() + self.advanced.len()
    }
}

/// Complete language analysis for one transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Key vocabulary with definitions and examples
    pub vocabulary: Vec<VocabularyEntry>,

    /// Grammar points with explanations
    pub grammar_points: Vec<GrammarPoint>,

    /// Lexicon words grouped by TOCFL band
    pub leveled_words: LeveledWords,

    /// Backend that produced it ("openai", "ollama" or "placeholder")
    pub source: String,

    /// Present on placeholder results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Ollama wire types
// ---------------------------------------------------------------------------

/// One chat message (shared between Ollama and OpenAI-compatible APIs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Ollama chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model name (e.g., "qwen2.5:1.5b")
    pub model: String,

    /// Conversation messages
    pub messages: Vec<ChatMessage>,

    /// Disable streaming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Force JSON output ("json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Generation options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChatOptions>,
}

/// Ollama generation options
#[derive(Debug, Clone, Serialize, Default)]
pub struct ChatOptions {
    /// Temperature (0.0 - 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

/// Ollama chat response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply
    pub message: ChatMessage,

    /// Whether generation is complete
    #[serde(default)]
    pub done: bool,
}

/// Ollama embedding request
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest {
    /// Embedding model name
    pub model: String,

    /// Text to embed
    pub prompt: String,
}

/// Ollama embedding response
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    /// Embedding vector
    pub embedding: Vec<f32>,
}

// ---------------------------------------------------------------------------
// OpenAI-compatible wire types
// ---------------------------------------------------------------------------

/// OpenAI chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiChatRequest {
    /// Model name (e.g., "gpt-3.5-turbo")
    pub model: String,

    /// Conversation messages
    pub messages: Vec<ChatMessage>,

    /// Temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// OpenAI chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChatResponse {
    /// Completion choices
    pub choices: Vec<OpenAiChoice>,
}

/// One completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    /// Assistant reply
    pub message: ChatMessage,
}

/// OpenAI embedding request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiEmbedRequest {
    /// Embedding model name
    pub model: String,

    /// Text to embed
    pub input: String,
}

/// OpenAI embedding response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiEmbedResponse {
    /// Embedding payloads
    pub data: Vec<OpenAiEmbedData>,
}

/// One embedding payload
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiEmbedData {
    /// Embedding vector
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_roles() {
        assert_eq!(ChatMessage::system("x").role, "system");
        assert_eq!(ChatMessage::user("x").role, "user");
    }

    #[test]
    fn test_analysis_result_note_skipped_when_none() {
        let result = AnalysisResult {
            vocabulary: Vec::new(),
            grammar_points: Vec::new(),
            leveled_words: LeveledWords::default(),
            source: "llm".to_string(),
            note: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("note"));
    }

    #[test]
    fn test_vocabulary_entry_partial_json() {
        // Tolerates missing optional fields from the LLM
        let entry: VocabularyEntry =
            serde_json::from_str(r#"{"word": "學習", "pinyin": "xué xí"}"#).unwrap();
        assert_eq!(entry.word, "學習");
        assert!(entry.english.is_empty());
    }

    #[test]
    fn test_leveled_words_total() {
        let mut words = LeveledWords::default();
        words.foundational.push(LeveledWord {
            word: "你".to_string(),
            pinyin: "nǐ".to_string(),
            zhuyin: String::new(),
            definition: "you".to_string(),
            level: 1,
            count: 3,
        });
        assert_eq!(words.total(), 1);
    }
}
