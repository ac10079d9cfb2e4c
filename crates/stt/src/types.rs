use serde::{Deserialize, Serialize};

/// One transcribed span with start/end timestamps in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f32,
    pub end: f32,
    /// Transcribed text, already converted to Traditional Chinese
    pub text: String,
}

impl Segment {
    pub fn new(start: f32, end: f32, text: String) -> Self {
        Self { start, end, text }
    }
}

/// Complete transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Full transcribed text
    pub text: String,

    /// Individual segments with timestamps
    pub segments: Vec<Segment>,

    /// Language reported by the decoder (ISO code)
    pub language: String,
}

impl Transcription {
    pub fn new(text: String, segments: Vec<Segment>, language: String) -> Self {
        Self {
            text,
            segments,
            language,
        }
    }

    /// Seconds of speech covered, taken from the last segment
    pub fn duration(&self) -> f32 {
        self.segments.last().map(|seg| seg.end).unwrap_or(0.0)
    }
}

/// Knobs for a single transcription run
#[derive(Debug, Clone)]
pub struct TranscriptionOptions {
    /// Language hint passed to the decoder ("zh", "en", ...)
    pub language: Option<String>,

    /// Initial prompt steering the decoder toward a script/register
    pub initial_prompt: Option<String>,

    /// Sampling temperature (0.0 = greedy)
    pub temperature: f32,

    /// Drop standalone filler segments
    pub filter_fillers: bool,

    /// Minimum segment length in characters
    pub min_segment_length: usize,

    /// Normalize repeated punctuation
    pub normalize_punctuation: bool,

    /// No-speech probability threshold
    pub no_speech_threshold: f32,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            language: Some("zh".to_string()),
            // Whisper emits Simplified for "zh" unless prompted otherwise
            initial_prompt: Some("以下是繁體中文的逐字稿。".to_string()),
            temperature: 0.0,
            filter_fillers: false,
            min_segment_length: 1,
            normalize_punctuation: true,
            no_speech_threshold: 0.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_duration() {
        let segments = vec![
            Segment::new(0.0, 2.0, "第一段".to_string()),
            Segment::new(2.0, 5.0, "第二段".to_string()),
        ];
        let transcription =
            Transcription::new("第一段 第二段".to_string(), segments, "zh".to_string());
        assert_eq!(transcription.duration(), 5.0);

        let empty = Transcription::new(String::new(), Vec::new(), "zh".to_string());
        assert_eq!(empty.duration(), 0.0);
    }

    #[test]
    fn test_default_options_target_chinese() {
        let options = TranscriptionOptions::default();
        assert_eq!(options.language.as_deref(), Some("zh"));
        assert!(options.initial_prompt.unwrap().contains("繁體中文"));
        assert_eq!(options.temperature, 0.0);
    }
}
