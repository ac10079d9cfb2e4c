use serde::{Deserialize, Serialize};

/// One rule block from the grammar corpus
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarRule {
    /// Rule text, whitespace-collapsed
    pub text: String,

    /// Level parsed from the 基礎/進階 第N級 marker
    pub level: Option<u8>,
}

/// One embedded rule in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedRule {
    /// Rule text
    pub text: String,

    /// Rule level
    #[serde(default)]
    pub level: Option<u8>,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// Persisted grammar index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarIndex {
    /// Embedding model the index was built with
    pub embedding_model: String,

    /// Embedded rules
    pub entries: Vec<IndexedRule>,
}

impl GrammarIndex {
    /// Create new empty index
    pub fn new(embedding_model: impl Into<String>) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            entries: Vec::new(),
        }
    }

    /// Number of indexed rules
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

/// Search result
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Rule text
    pub text: String,

    /// Rule level
    pub level: Option<u8>,

    /// Similarity score (-1.0 to 1.0)
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let mut index = GrammarIndex::new("nomic-embed-text");
        index.entries.push(IndexedRule {
            text: "是...的 用於強調。".to_string(),
            level: Some(1),
            embedding: vec![0.1, 0.2, 0.3],
        });

        let json = serde_json::to_string(&index).unwrap();
        let loaded: GrammarIndex = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.embedding_model, "nomic-embed-text");
        assert_eq!(loaded.count(), 1);
        assert_eq!(loaded.entries[0].level, Some(1));
    }

    #[test]
    fn test_index_tolerates_missing_level() {
        let json = r#"{"embedding_model": "m", "entries": [{"text": "rule", "embedding": [1.0]}]}"#;
        let loaded: GrammarIndex = serde_json::from_str(json).unwrap();
        assert_eq!(loaded.entries[0].level, None);
    }
}
