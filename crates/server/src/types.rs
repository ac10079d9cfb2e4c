use serde::{Deserialize, Serialize};

use cntube_analysis::AnalysisResult;
use cntube_media::VideoInfo;
use cntube_stt::Segment;

/// Video processing request
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// Video page URL
    pub video_url: String,

    /// Learner level for grammar retrieval (1-7)
    pub user_level: Option<u8>,
}

/// Successful processing response
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// Always true on this path
    pub success: bool,

    /// Video metadata from the probe
    pub video: VideoInfo,

    /// Full transcript text
    pub transcription: String,

    /// Timed transcript segments
    pub segments: Vec<Segment>,

    /// Language analysis
    pub analysis: AnalysisResult,
}

/// Error payload carrying the stage that failed
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error
    pub error: String,

    /// "validation", "download", "transcription" or "analysis"
    pub stage: String,
}

/// Health payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy"
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cntube_analysis::LeveledWords;

    #[test]
    fn test_process_request_level_optional() {
        let req: ProcessRequest =
            serde_json::from_str(r#"{"video_url": "https://youtube.com/watch?v=abc123"}"#).unwrap();
        assert_eq!(req.user_level, None);

        let req: ProcessRequest = serde_json::from_str(
            r#"{"video_url": "https://youtube.com/watch?v=abc123", "user_level": 3}"#,
        )
        .unwrap();
        assert_eq!(req.user_level, Some(3));
    }

    #[test]
    fn test_process_response_shape() {
        let response = ProcessResponse {
            success: true,
            video: VideoInfo {
                id: "abc123".to_string(),
                title: "範例影片".to_string(),
                duration: Some(12.5),
            },
            transcription: "我們學習中文。".to_string(),
            segments: vec![Segment::new(0.0, 1.5, "我們學習中文。".to_string())],
            analysis: AnalysisResult {
                vocabulary: Vec::new(),
                grammar_points: Vec::new(),
                leveled_words: LeveledWords::default(),
                source: "placeholder".to_string(),
                note: None,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["video"]["id"], "abc123");
        assert!(json["segments"].is_array());
        assert_eq!(json["analysis"]["source"], "placeholder");
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "Invalid URL".to_string(),
            stage: "validation".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["stage"], "validation");
    }
}
