use cntube_common::{CntubeError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio;
use crate::postprocess;
use crate::types::{Segment, Transcription, TranscriptionOptions};

/// GPU device type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuDevice {
    /// CUDA (NVIDIA GPU)
    Cuda,
    /// Metal (Apple GPU)
    Metal,
    /// CPU only
    Cpu,
}

/// Whisper STT Engine
pub struct WhisperEngine {
    ctx: Arc<WhisperContext>,
    model_path: String,
    gpu_device: GpuDevice,
}

impl WhisperEngine {
    /// Detect the GPU backend compiled into this build.
    ///
    /// CUDA/Metal support is controlled by feature flags:
    /// - `--features cuda` builds the CUDA backend
    /// - `--features metal` builds the Metal backend (default on macOS)
    /// - with neither, inference runs on CPU
    fn detect_gpu_device() -> GpuDevice {
        if cfg!(feature = "cuda") {
            info!("CUDA feature enabled; building Whisper with CUDA backend");
            GpuDevice::Cuda
        } else if cfg!(feature = "metal") {
            info!("Metal feature enabled; building Whisper with Metal backend");
            GpuDevice::Metal
        } else {
            info!("No GPU features enabled; building Whisper for CPU only");
            GpuDevice::Cpu
        }
    }

    /// Create a new Whisper engine from model path with automatic GPU detection
    ///
    /// # Arguments
    /// * `model_path` - Path to the Whisper model file (.bin or .gguf)
    ///
    /// # Example
    /// ```no_run
    /// use cntube_stt::WhisperEngine;
    ///
    /// let engine = WhisperEngine::new("models/ggml-base.bin").unwrap();
    /// ```
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(CntubeError::transcription(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let path_str = path.to_str().ok_or_else(|| {
            CntubeError::transcription("Model path contains invalid UTF-8".to_string())
        })?;

        info!("Loading Whisper model from: {}", path.display());

        let gpu_device = Self::detect_gpu_device();
        info!("Using device: {:?}", gpu_device);

        let mut params = WhisperContextParameters::new();
        params.use_gpu(gpu_device != GpuDevice::Cpu);

        let ctx = match WhisperContext::new_with_params(path_str, params) {
            Ok(ctx) => ctx,
            Err(e) => {
                // Fall back to CPU when the GPU backend fails to initialize
                if gpu_device != GpuDevice::Cpu {
                    warn!("Failed to load model with GPU ({:?}): {}", gpu_device, e);
                    warn!("Falling back to CPU");

                    let mut cpu_params = WhisperContextParameters::new();
                    cpu_params.use_gpu(false);

                    WhisperContext::new_with_params(path_str, cpu_params).map_err(|e| {
                        CntubeError::transcription(format!(
                            "Failed to load Whisper model even with CPU: {}",
                            e
                        ))
                    })?
                } else {
                    return Err(CntubeError::transcription(format!(
                        "Failed to load Whisper model: {}",
                        e
                    )));
                }
            }
        };

        info!("Whisper model loaded successfully");

        Ok(Self {
            ctx: Arc::new(ctx),
            model_path: path.to_string_lossy().to_string(),
            gpu_device,
        })
    }

    /// Transcribe an audio file.
    ///
    /// Runs full Whisper inference; call from a blocking context.
    ///
    /// # Arguments
    /// * `audio_path` - Path to the audio file
    /// * `options` - Transcription options
    ///
    /// # Returns
    /// Transcription result with text and segments
    pub fn transcribe(
        &self,
        audio_path: impl AsRef<Path>,
        options: &TranscriptionOptions,
    ) -> Result<Transcription> {
        let path = audio_path.as_ref();

        if !path.exists() {
            return Err(CntubeError::transcription(format!(
                "Audio file not found: {}",
                path.display()
            )));
        }

        info!("Transcribing audio file: {}", path.display());

        // Load audio as 16kHz mono samples
        let samples = audio::load_samples(path)?;

        // Create transcription parameters
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // Set language
        if let Some(lang) = &options.language {
            params.set_language(Some(lang.as_str()));
        }

        // Set initial prompt (steers output toward Traditional Chinese)
        if let Some(prompt) = &options.initial_prompt {
            params.set_initial_prompt(prompt);
        }

        // Set thresholds
        params.set_temperature(options.temperature);
        params.set_no_speech_thold(options.no_speech_threshold);

        // Keep whisper.cpp quiet on the server console
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        // Create a new state for this transcription
        let mut state = self.ctx.create_state().map_err(|e| {
            CntubeError::transcription(format!("Failed to create Whisper state: {}", e))
        })?;

        // Run transcription
        debug!("Starting Whisper inference ({} samples)", samples.len());
        state.full(params, &samples).map_err(|e| {
            CntubeError::transcription(format!("Transcription failed: {}", e))
        })?;

        // Extract results
        let num_segments = state.full_n_segments();
        debug!("Transcription complete, {} segments found", num_segments);

        let mut segments = Vec::new();

        for i in 0..num_segments {
            let segment = state.get_segment(i).ok_or_else(|| {
                CntubeError::transcription(format!("Segment {} not found", i))
            })?;

            let segment_text = segment
                .to_str_lossy()
                .map_err(|e| {
                    CntubeError::transcription(format!("Failed to get segment text: {}", e))
                })?
                .into_owned();

            // Convert from centiseconds to seconds
            let start_sec = segment.start_timestamp() as f32 / 100.0;
            let end_sec = segment.end_timestamp() as f32 / 100.0;

            // Post-process text (script conversion, hallucination filtering)
            let processed_text = postprocess::process_segment_text(
                &segment_text,
                options.filter_fillers,
                options.min_segment_length,
                options.normalize_punctuation,
            );

            // Skip empty or filtered segments
            if processed_text.is_empty() {
                continue;
            }

            segments.push(Segment::new(start_sec, end_sec, processed_text));
        }

        // Detected language from the decoder state
        let language = whisper_rs::get_lang_str(state.full_lang_id_from_state())
            .unwrap_or("unknown")
            .to_string();

        // Merge duplicated consecutive segments before assembling the full
        // text, so repeated decoder output appears only once
        let segments = postprocess::merge_segments(segments, 0.2);
        let full_text = segments
            .iter()
            .map(|seg| seg.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let transcription = Transcription::new(full_text, segments, language);
        info!(
            "Transcription successful: {} segments, {} characters, {:.1}s of speech, language={}",
            transcription.segments.len(),
            transcription.text.chars().count(),
            transcription.duration(),
            transcription.language
        );

        Ok(transcription)
    }

    /// Get model path
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Get GPU device being used
    pub fn gpu_device(&self) -> GpuDevice {
        self.gpu_device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation_with_missing_model() {
        let result = WhisperEngine::new("nonexistent_model.bin");
        assert!(result.is_err());
    }
}
