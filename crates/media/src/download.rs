//! Video probing and audio extraction via yt-dlp
//!
//! All yt-dlp invocations pass arguments with `.arg()` (no shell expansion)
//! and `--no-exec` so post-processing commands cannot run.

use std::path::{Path, PathBuf};

use cntube_common::{CntubeError, Result};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Metadata for the video behind a URL
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct VideoInfo {
    /// Platform video id
    pub id: String,

    /// Video title
    pub title: String,

    /// Duration in seconds, when the platform reports one
    pub duration: Option<f64>,
}

#[derive(Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
}

/// Validate that a string looks like a URL.
/// Rejects anything that isn't http:// or https://.
pub fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(CntubeError::invalid_input(format!(
            "invalid URL (must start with http:// or https://): {trimmed}"
        )))
    }
}

/// Build a yt-dlp command, honoring YTDLP_PATH
fn ytdlp_command() -> (String, Command) {
    let program = std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string());
    let command = Command::new(&program);
    (program, command)
}

async fn run_ytdlp(program: &str, command: &mut Command) -> Result<std::process::Output> {
    command.output().await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CntubeError::download(format!(
            "{program} not found; install yt-dlp or set YTDLP_PATH"
        )),
        _ => CntubeError::Io(e),
    })
}

fn truncate_stderr(stderr: &[u8]) -> String {
    // Limit error message length to avoid dumping huge stderr
    String::from_utf8_lossy(stderr).chars().take(1000).collect()
}

/// Fetch video metadata without downloading anything
pub async fn probe_video(url: &str) -> Result<VideoInfo> {
    validate_url(url)?;

    debug!(%url, "probing video metadata");

    let (program, mut command) = ytdlp_command();
    command
        .args(["--dump-json", "--no-download", "--no-playlist", "--no-exec"])
        .arg(url);

    let output = run_ytdlp(&program, &mut command).await?;

    if !output.status.success() {
        return Err(CntubeError::download(format!(
            "yt-dlp probe failed: {}",
            truncate_stderr(&output.stderr)
        )));
    }

    let info: YtDlpInfo = serde_json::from_slice(&output.stdout)
        .map_err(|e| CntubeError::download(format!("yt-dlp returned unparseable metadata: {e}")))?;

    Ok(VideoInfo {
        id: info.id.unwrap_or_else(|| "unknown".to_string()),
        title: info.title.unwrap_or_else(|| "Unknown".to_string()),
        duration: info.duration,
    })
}

/// Download the best audio track as mp3 into `output_dir`.
/// Returns the path to the extracted audio file.
pub async fn fetch_audio(url: &str, output_dir: &Path) -> Result<PathBuf> {
    validate_url(url)?;

    info!(%url, "downloading audio");

    std::fs::create_dir_all(output_dir)?;

    let output_template = output_dir
        .join("audio.%(ext)s")
        .to_str()
        .ok_or_else(|| {
            CntubeError::download("output directory path contains invalid UTF-8".to_string())
        })?
        .to_string();

    let (program, mut command) = ytdlp_command();
    command
        .args([
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "192K",
            "--no-playlist",
            "--no-exec",
            "--output",
            &output_template,
            "--print",
            "after_move:filepath",
        ])
        .arg(url);

    let output = run_ytdlp(&program, &mut command).await?;

    if !output.status.success() {
        return Err(CntubeError::download(format!(
            "yt-dlp failed: {}",
            truncate_stderr(&output.stderr)
        )));
    }

    let audio_path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();

    // yt-dlp --print after_move:filepath gives us the final path
    let audio_path = if audio_path_str.is_empty() {
        // Fallback: find the file in output_dir
        find_audio_file(output_dir)?
    } else {
        let candidate = PathBuf::from(&audio_path_str);
        // Validate the returned path is inside output_dir
        validate_path_in_dir(&candidate, output_dir)?;
        candidate
    };

    if !audio_path.exists() {
        return Err(CntubeError::download(format!(
            "downloaded file not found at {}",
            audio_path.display()
        )));
    }

    debug!(path = %audio_path.display(), "audio downloaded");

    Ok(audio_path)
}

/// Normalize a path by resolving `.` and `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir => {}
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Validate that a path is inside the expected directory (prevents path traversal).
fn validate_path_in_dir(path: &Path, expected_dir: &Path) -> Result<()> {
    let canonical_dir = expected_dir
        .canonicalize()
        .unwrap_or_else(|_| normalize_path(expected_dir));
    let canonical_path = path
        .canonicalize()
        .unwrap_or_else(|_| normalize_path(path));

    if canonical_path.starts_with(&canonical_dir) {
        Ok(())
    } else {
        warn!(
            path = %path.display(),
            expected_dir = %expected_dir.display(),
            "downloaded file path outside expected directory"
        );
        Err(CntubeError::download(
            "downloaded file path is outside the expected output directory".to_string(),
        ))
    }
}

/// Find the most recently modified audio file in a directory.
fn find_audio_file(dir: &Path) -> Result<PathBuf> {
    let mut best: Option<(PathBuf, std::time::SystemTime)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if matches!(ext, "mp3" | "m4a" | "wav" | "webm" | "opus" | "ogg" | "flac") {
                if let Ok(meta) = entry.metadata() {
                    if let Ok(modified) = meta.modified() {
                        if best.as_ref().map_or(true, |(_, t)| modified > *t) {
                            best = Some((path, modified));
                        }
                    }
                }
            }
        }
    }

    best.map(|(p, _)| p)
        .ok_or_else(|| CntubeError::download("no audio file found after download".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_https() {
        assert!(validate_url("https://youtube.com/watch?v=abc").is_ok());
    }

    #[test]
    fn test_validate_url_http() {
        assert!(validate_url("http://example.com/video").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_no_scheme() {
        assert!(validate_url("youtube.com/watch?v=abc").is_err());
    }

    #[test]
    fn test_validate_url_rejects_file_scheme() {
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_validate_url_rejects_empty() {
        assert!(validate_url("").is_err());
    }

    #[test]
    fn test_validate_url_rejects_command() {
        assert!(validate_url("$(whoami)").is_err());
    }

    #[test]
    fn test_validate_url_rejects_pipe() {
        assert!(validate_url("| cat /etc/passwd").is_err());
    }

    #[test]
    fn test_validate_path_in_dir_valid() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("audio.mp3");
        std::fs::write(&path, b"x").unwrap();
        assert!(validate_path_in_dir(&path, tmp.path()).is_ok());
    }

    #[test]
    fn test_validate_path_in_dir_traversal() {
        let dir = std::env::temp_dir().join("cntube_test");
        let path = PathBuf::from("/etc/passwd");
        assert!(validate_path_in_dir(&path, &dir).is_err());
    }

    #[test]
    fn test_validate_path_in_dir_parent_traversal() {
        let dir = std::env::temp_dir().join("cntube_test");
        let path = dir.join("..").join("..").join("etc").join("passwd");
        assert!(validate_path_in_dir(&path, &dir).is_err());
    }

    #[test]
    fn test_find_audio_file_prefers_latest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("audio.mp3"), b"x").unwrap();
        let found = find_audio_file(tmp.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "audio.mp3");
    }

    #[test]
    fn test_find_audio_file_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(find_audio_file(tmp.path()).is_err());
    }
}
