//! CNtube STT (Speech-to-Text) Engine
//!
//! Whisper.cpp based speech recognition tuned for Traditional Chinese output

pub mod audio;
pub mod postprocess;
pub mod types;
pub mod whisper;

// Re-export main types
pub use types::{Segment, Transcription, TranscriptionOptions};
pub use whisper::{WhisperEngine, GpuDevice};
