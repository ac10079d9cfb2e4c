//! TOCFL/COCT word-level lexicon and leveled vocabulary extraction

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use cntube_common::{CntubeError, Result};

use crate::types::{LeveledWord, LeveledWords};

/// Cap per difficulty band in the response
pub const MAX_WORDS_PER_BAND: usize = 10;

/// One lexicon record
#[derive(Debug, Clone)]
pub struct LexiconEntry {
    /// Hanyu pinyin
    pub pinyin: String,

    /// Zhuyin (bopomofo)
    pub zhuyin: String,

    /// English definition
    pub definition: String,

    /// TOCFL level (1-7)
    pub level: u8,
}

/// Lexicon files carry either full records or a bare level number per word
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Detailed {
        #[serde(default)]
        pinyin: String,
        #[serde(default)]
        zhuyin: String,
        #[serde(default)]
        definition: String,
        level: u8,
    },
    Level(u8),
}

impl From<RawEntry> for LexiconEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Detailed {
                pinyin,
                zhuyin,
                definition,
                level,
            } => Self {
                pinyin,
                zhuyin,
                definition,
                level,
            },
            RawEntry::Level(level) => Self {
                pinyin: String::new(),
                zhuyin: String::new(),
                definition: String::new(),
                level,
            },
        }
    }
}

/// Word-level lexicon keyed by Traditional Chinese word
#[derive(Debug, Default)]
pub struct Lexicon {
    words: HashMap<String, LexiconEntry>,

    /// Longest key in characters, bounds the maximum-match window
    max_word_chars: usize,
}

impl Lexicon {
    /// Load the lexicon from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CntubeError::file_system(format!("Failed to read lexicon {}: {}", path.display(), e))
        })?;

        let raw: HashMap<String, RawEntry> = serde_json::from_str(&content)?;

        let words: HashMap<String, LexiconEntry> = raw
            .into_iter()
            .map(|(word, entry)| (word, entry.into()))
            .collect();

        let max_word_chars = words.keys().map(|w| w.chars().count()).max().unwrap_or(0);

        info!("Loaded {} words from lexicon {}", words.len(), path.display());
        Ok(Self {
            words,
            max_word_chars,
        })
    }

    /// Load the lexicon, falling back to an empty one when the file is
    /// missing or malformed
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(lexicon) => lexicon,
            Err(e) => {
                warn!(
                    "Lexicon unavailable ({}), leveled extraction disabled: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Number of words in the lexicon
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the lexicon is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Look up a word
    pub fn get(&self, word: &str) -> Option<&LexiconEntry> {
        self.words.get(word)
    }

    /// Level of a word, if the lexicon knows it
    pub fn level_of(&self, word: &str) -> Option<u8> {
        self.words.get(word).map(|entry| entry.level)
    }

    /// Extract lexicon words from the text and group them by difficulty band
    ///
    /// Segmentation is forward maximum match against the lexicon keys.
    /// Single-character words are skipped; frequency is counted across the
    /// whole text; each band keeps at most `max_per_band` words, highest
    /// level and highest count first.
    pub fn extract_leveled(&self, text: &str, max_per_band: usize) -> LeveledWords {
        if text.is_empty() || self.words.is_empty() {
            return LeveledWords::default();
        }

        // Byte offset of every character, with a sentinel for the end
        let chars: Vec<char> = text.chars().collect();
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());

        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut pos = 0;

        while pos < chars.len() {
            if !is_cjk(chars[pos]) {
                pos += 1;
                continue;
            }

            let window = self.max_word_chars.min(chars.len() - pos);
            let mut matched = 0;

            for len in (2..=window).rev() {
                let candidate = &text[offsets[pos]..offsets[pos + len]];
                if self.words.contains_key(candidate) {
                    *counts.entry(candidate.to_string()).or_insert(0) += 1;
                    matched = len;
                    break;
                }
            }

            pos += matched.max(1);
        }

        let mut found: Vec<LeveledWord> = counts
            .into_iter()
            .filter_map(|(word, count)| {
                self.words.get(&word).map(|entry| LeveledWord {
                    word: word.clone(),
                    pinyin: entry.pinyin.clone(),
                    zhuyin: entry.zhuyin.clone(),
                    definition: entry.definition.clone(),
                    level: entry.level,
                    count,
                })
            })
            .collect();

        // Highest level first, most frequent first within a level
        found.sort_by(|a, b| b.level.cmp(&a.level).then(b.count.cmp(&a.count)));

        let mut result = LeveledWords::default();
        for word in found {
            let band = match word.level {
                0..=2 => &mut result.foundational,
                3..=4 => &mut result.intermediate,
                _ => &mut result.advanced,
            };
            if band.len() < max_per_band {
                band.push(word);
            }
        }

        result
    }
}

/// CJK unified ideographs (base block plus extension A)
fn is_cjk(c: char) -> bool {
    matches!(c as u32, 0x4E00..=0x9FFF | 0x3400..=0x4DBF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_lexicon() -> Lexicon {
        let json = r#"{
            "學習": {"pinyin": "xué xí", "zhuyin": "ㄒㄩㄝˊ ㄒㄧˊ", "definition": "to learn", "level": 1},
            "中文": {"pinyin": "zhōng wén", "zhuyin": "", "definition": "Chinese", "level": 1},
            "中文課": {"pinyin": "zhōng wén kè", "zhuyin": "", "definition": "Chinese class", "level": 3},
            "影片": {"pinyin": "yǐng piàn", "zhuyin": "", "definition": "video", "level": 2},
            "語法": 4,
            "艱澀": {"pinyin": "jiān sè", "zhuyin": "", "definition": "obscure", "level": 6}
        }"#;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        Lexicon::load(&path).unwrap()
    }

    #[test]
    fn test_load_accepts_both_entry_shapes() {
        let lexicon = sample_lexicon();
        assert_eq!(lexicon.len(), 6);
        assert_eq!(lexicon.level_of("學習"), Some(1));
        assert_eq!(lexicon.level_of("語法"), Some(4));
        assert!(lexicon.get("語法").unwrap().pinyin.is_empty());
    }

    #[test]
    fn test_load_or_empty_on_missing_file() {
        let lexicon = Lexicon::load_or_empty(Path::new("/nonexistent/words.json"));
        assert!(lexicon.is_empty());
    }

    #[test]
    fn test_extract_counts_and_bands() {
        let lexicon = sample_lexicon();
        let words = lexicon.extract_leveled("我學習中文，學習語法。這部影片教的是艱澀的語法。", 10);

        let foundational: Vec<&str> = words.foundational.iter().map(|w| w.word.as_str()).collect();
        assert!(foundational.contains(&"學習"));
        assert!(foundational.contains(&"中文"));
        assert!(foundational.contains(&"影片"));

        let xuexi = words
            .foundational
            .iter()
            .find(|w| w.word == "學習")
            .unwrap();
        assert_eq!(xuexi.count, 2);

        assert_eq!(words.intermediate.len(), 1);
        assert_eq!(words.intermediate[0].word, "語法");
        assert_eq!(words.intermediate[0].count, 2);

        assert_eq!(words.advanced.len(), 1);
        assert_eq!(words.advanced[0].word, "艱澀");
    }

    #[test]
    fn test_extract_prefers_longest_match() {
        let lexicon = sample_lexicon();
        let words = lexicon.extract_leveled("我今天上中文課。", 10);

        assert_eq!(words.intermediate.len(), 1);
        assert_eq!(words.intermediate[0].word, "中文課");
        // The shorter 中文 must not also be counted from the same span
        assert!(words.foundational.iter().all(|w| w.word != "中文"));
    }

    #[test]
    fn test_extract_respects_band_cap() {
        let lexicon = sample_lexicon();
        let words = lexicon.extract_leveled("學習中文影片學習中文影片", 1);
        assert_eq!(words.foundational.len(), 1);
    }

    #[test]
    fn test_extract_empty_text() {
        let lexicon = sample_lexicon();
        assert_eq!(lexicon.extract_leveled("", 10).total(), 0);
    }
}
