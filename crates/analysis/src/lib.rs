//! CNtube Language Analysis
//!
//! LLM-backed vocabulary and grammar extraction for Traditional Chinese
//! transcripts, with a lexicon-based leveled word list and a deterministic
//! placeholder when no backend is configured.

mod analyzer;
mod chunking;
mod client;
mod lexicon;
mod llm_trait;
mod openai_client;
mod prompts;
mod types;

pub use analyzer::{client_from_config, LanguageAnalyzer};
pub use chunking::{chunk_text, TextChunk};
pub use client::OllamaClient;
pub use lexicon::{Lexicon, LexiconEntry, MAX_WORDS_PER_BAND};
pub use llm_trait::LlmClient;
pub use openai_client::OpenAiClient;
pub use prompts::{grammar_prompt, vocabulary_prompt};
pub use types::{
    AnalysisResult, ChatMessage, GrammarPoint, LeveledWord, LeveledWords, VocabularyEntry,
};
