//! Whisper model download and verification
//!
//! Models are fetched from the whisper.cpp Hugging Face mirror on first use
//! and cached under a per-user directory.

use crate::error::CntubeError;
use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

const HF_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Known ggml models: (name, approximate size in MiB).
const WHISPER_MODELS: &[(&str, u64)] = &[
    ("tiny", 75),
    ("base", 142),
    ("small", 466),
    ("medium", 1500),
    ("large-v3", 3100),
];

/// A downloadable Whisper model
#[derive(Debug, Clone)]
pub struct WhisperModel {
    /// Model name ("base", "small", ...)
    pub name: String,

    /// Approximate file size in bytes
    pub size: u64,

    /// Pinned SHA256, when we want to verify the cached file
    pub sha256: Option<String>,

    /// Download URL
    pub url: String,
}

impl WhisperModel {
    /// Look up a model by name
    pub fn by_name(name: &str) -> Option<Self> {
        WHISPER_MODELS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(n, size_mib)| Self {
                name: (*n).to_string(),
                size: size_mib * 1024 * 1024,
                sha256: None,
                url: format!("{}/ggml-{}.bin", HF_BASE_URL, n),
            })
    }

    /// File name on disk
    pub fn filename(&self) -> String {
        format!("ggml-{}.bin", self.name)
    }

    /// Approximate size in MB
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }
}

/// All models this build knows how to fetch
pub fn available_whisper_models() -> Vec<WhisperModel> {
    WHISPER_MODELS
        .iter()
        .filter_map(|(name, _)| WhisperModel::by_name(name))
        .collect()
}

/// Downloads and caches Whisper models
pub struct ModelManager {
    models_dir: PathBuf,
    client: Client,
}

impl ModelManager {
    pub fn new(models_dir: PathBuf) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3600)) // large-v3 is ~3 GB
            .build()
            .map_err(|e| CntubeError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { models_dir, client })
    }

    /// Per-user model cache directory; `CNTUBE_MODELS_DIR` overrides it.
    pub fn default_models_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os("CNTUBE_MODELS_DIR") {
            return PathBuf::from(dir);
        }

        let base = if cfg!(target_os = "macos") {
            std::env::var_os("HOME").map(|h| PathBuf::from(h).join("Library/Caches"))
        } else if cfg!(target_os = "windows") {
            std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
        } else {
            std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache"))
        };

        match base {
            Some(dir) => dir.join("cntube").join("models"),
            None => PathBuf::from("models"),
        }
    }

    /// Return the local path for `model_name`, downloading it first if needed.
    ///
    /// An already-cached file is re-downloaded only when a pinned hash
    /// fails to match.
    pub async fn ensure_whisper_model(&self, model_name: &str) -> Result<PathBuf> {
        let model = WhisperModel::by_name(model_name).ok_or_else(|| {
            CntubeError::config(format!("Unknown Whisper model: {}", model_name))
        })?;
        let model_path = self.models_dir.join(model.filename());

        if model_path.exists() {
            if self.verify(&model_path, model.sha256.as_deref()).await? {
                info!("Using cached model: {}", model_path.display());
                return Ok(model_path);
            }
            warn!(
                "Cached model failed verification, re-downloading: {}",
                model_path.display()
            );
        } else {
            info!("Model not cached, downloading: {}", model_name);
        }

        self.download(&model, &model_path).await?;
        Ok(model_path)
    }

    /// Stream the model to `dest`, writing through a temp file so an
    /// interrupted download never leaves a half-written model behind.
    async fn download(&self, model: &WhisperModel, dest: &Path) -> Result<()> {
        info!(
            "Downloading {} ({:.0} MB) from {}",
            model.filename(),
            model.size_mb(),
            model.url
        );

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        // TODO: check free disk space before starting multi-GB downloads

        let response = self
            .client
            .get(&model.url)
            .send()
            .await
            .map_err(|e| CntubeError::network(format!("Model download request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CntubeError::download(format!(
                "Model download failed with status {}",
                response.status()
            )));
        }

        let pb = ProgressBar::new(model.size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                .unwrap()
                .progress_chars("=> "),
        );
        pb.set_message(model.filename());

        let temp_path = dest.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        let mut stream = response.bytes_stream();

        use futures::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| CntubeError::network(format!("Model download error: {}", e)))?;
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }

        pb.finish_and_clear();
        file.sync_all().await?;
        drop(file);

        // Table sizes are approximate, so only reject obviously truncated files
        let metadata = fs::metadata(&temp_path).await?;
        if metadata.len() < model.size / 2 {
            fs::remove_file(&temp_path).await?;
            return Err(CntubeError::download(format!(
                "Downloaded model is truncated ({} bytes, expected ~{})",
                metadata.len(),
                model.size
            )));
        }

        fs::rename(&temp_path, dest).await?;
        info!("Model ready: {}", dest.display());

        Ok(())
    }

    /// True when the file exists and matches `expected_hash` (or no hash is pinned).
    async fn verify(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        let Some(expected) = expected_hash else {
            return Ok(true);
        };

        info!("Verifying model checksum: {}", path.display());

        let data = fs::read(path).await?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = format!("{:x}", hasher.finalize());

        Ok(hash == expected)
    }
}
