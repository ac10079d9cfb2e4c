pub mod download;
pub mod session;

// Re-export commonly used types
pub use download::{fetch_audio, probe_video, validate_url, VideoInfo};
pub use session::TempSession;
