/// CNtube error types
#[derive(Debug, thiserror::Error)]
pub enum CntubeError {
    /// Invalid input (bad URL, empty body, out-of-range parameter)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Video download / audio extraction error
    #[error("Download error: {0}")]
    Download(String),

    /// Speech-to-text error
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Language-analysis service error (network/auth/quota/parse)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CntubeError {
    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create download error
    pub fn download<S: Into<String>>(msg: S) -> Self {
        Self::Download(msg.into())
    }

    /// Create transcription error
    pub fn transcription<S: Into<String>>(msg: S) -> Self {
        Self::Transcription(msg.into())
    }

    /// Create analysis error
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        Self::Analysis(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create file system error
    pub fn file_system<S: Into<String>>(msg: S) -> Self {
        Self::FileSystem(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

// HTTP response conversion (used by the server's error mapping)
impl CntubeError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Analysis(_) => 502,
            Self::Network(_) => 503,
            Self::Download(_) => 500,
            Self::Transcription(_) => 500,
            Self::Config(_) => 500,
            Self::FileSystem(_) => 500,
            Self::Internal(_) => 500,
            Self::Io(_) => 500,
            Self::Json(_) => 400,
            Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CntubeError::invalid_input("bad url").status_code(), 400);
        assert_eq!(CntubeError::not_found("x").status_code(), 404);
        assert_eq!(CntubeError::analysis("quota").status_code(), 502);
        assert_eq!(CntubeError::network("refused").status_code(), 503);
        assert_eq!(CntubeError::download("yt-dlp failed").status_code(), 500);
        assert_eq!(CntubeError::transcription("whisper").status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = CntubeError::download("no formats found");
        assert_eq!(err.to_string(), "Download error: no formats found");
    }
}
