//! Audio preprocessing and conversion
//!
//! Handles audio format conversion, resampling, and normalization

use cntube_common::{CntubeError, Result};
use std::path::Path;
use tracing::{info, warn};

/// Sample rate Whisper expects
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Supported audio file extensions
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "flac", "m4a", "mp3", "mp4", "mpeg", "mpga", "oga", "ogg", "opus", "wav", "webm",
];

/// Check if file extension is supported
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Audio buffer (f32 samples normalized to [-1.0, 1.0])
pub struct AudioBuffer {
    /// Audio samples
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,
}

impl AudioBuffer {
    /// Create a new audio buffer
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Get duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        (self.samples.len() / self.channels as usize) as f32 / self.sample_rate as f32
    }

    /// Convert to mono by averaging channels
    pub fn to_mono(mut self) -> Self {
        if self.channels == 1 {
            return self;
        }

        info!("Converting {} channel audio to mono", self.channels);

        let channels = self.channels as usize;
        let num_frames = self.samples.len() / channels;
        let mut mono_samples = Vec::with_capacity(num_frames);

        for frame_idx in 0..num_frames {
            let mut sum = 0.0;
            for ch in 0..channels {
                sum += self.samples[frame_idx * channels + ch];
            }
            mono_samples.push(sum / channels as f32);
        }

        self.samples = mono_samples;
        self.channels = 1;
        self
    }

    /// Resample to target sample rate
    ///
    /// Simple linear interpolation resampler; only correct for mono buffers.
    pub fn resample(mut self, target_rate: u32) -> Self {
        if self.sample_rate == target_rate || self.samples.is_empty() {
            self.sample_rate = target_rate;
            return self;
        }

        info!("Resampling from {}Hz to {}Hz", self.sample_rate, target_rate);

        let ratio = self.sample_rate as f64 / target_rate as f64;
        let new_length = (self.samples.len() as f64 / ratio) as usize;
        let mut resampled = Vec::with_capacity(new_length);

        for i in 0..new_length {
            let src_index = i as f64 * ratio;
            let src_index_floor = src_index.floor() as usize;
            let src_index_ceil = (src_index_floor + 1).min(self.samples.len() - 1);
            let fraction = src_index - src_index_floor as f64;

            // Linear interpolation
            let sample = self.samples[src_index_floor] * (1.0 - fraction) as f32
                + self.samples[src_index_ceil] * fraction as f32;

            resampled.push(sample);
        }

        self.samples = resampled;
        self.sample_rate = target_rate;
        self
    }
}

/// Load a WAV file into an audio buffer
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        CntubeError::transcription(format!("Failed to open WAV file {}: {}", path.display(), e))
    })?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| {
                    CntubeError::transcription(format!("Failed to read WAV samples: {}", e))
                })?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| {
                CntubeError::transcription(format!("Failed to read WAV samples: {}", e))
            })?,
    };

    Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
}

/// Load any supported audio file as 16kHz mono samples.
///
/// Non-WAV inputs are converted through FFmpeg into a sibling WAV file
/// which is removed once loaded.
pub fn load_samples(path: &Path) -> Result<Vec<f32>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let buffer = if ext == "wav" {
        load_wav(path)?
    } else {
        if !is_supported_audio(path) {
            warn!("Unknown audio format: {:?}, attempting conversion", ext);
        }
        let wav_path = path.with_extension("wav");
        convert_to_wav_ffmpeg(path, &wav_path)?;
        let loaded = load_wav(&wav_path);
        if let Err(e) = std::fs::remove_file(&wav_path) {
            warn!("Failed to remove converted WAV file: {}", e);
        }
        loaded?
    };

    let buffer = buffer.to_mono().resample(WHISPER_SAMPLE_RATE);
    Ok(buffer.samples)
}

/// Convert audio file to 16kHz mono WAV using FFmpeg
pub fn convert_to_wav_ffmpeg(input_path: &Path, output_path: &Path) -> Result<()> {
    use std::process::Command;

    info!("Converting {} to WAV using FFmpeg", input_path.display());

    // Get FFmpeg path from environment or use default
    let ffmpeg_cmd = std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string());

    let output = Command::new(&ffmpeg_cmd)
        .args([
            "-i", &input_path.to_string_lossy(),
            "-ar", "16000",      // 16kHz sample rate
            "-ac", "1",          // Mono
            "-c:a", "pcm_s16le", // 16-bit PCM
            "-y",                // Overwrite output
            &output_path.to_string_lossy(),
        ])
        .output()
        .map_err(|e| {
            CntubeError::transcription(format!(
                "Failed to run FFmpeg: {}. Install FFmpeg or set FFMPEG_PATH.",
                e
            ))
        })?;

    if !output.status.success() {
        let stderr: String = String::from_utf8_lossy(&output.stderr)
            .chars()
            .take(1000)
            .collect();
        return Err(CntubeError::transcription(format!(
            "FFmpeg conversion failed: {}",
            stderr
        )));
    }

    info!("FFmpeg conversion successful: {}", output_path.display());

    Ok(())
}
