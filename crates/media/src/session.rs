//! Per-request working directories

use std::path::{Path, PathBuf};

use cntube_common::{CntubeError, Result};
use tracing::{debug, warn};
use uuid::Uuid;

/// Working directory for one processing request.
///
/// The directory is removed when the session is dropped, so intermediate
/// files (downloaded audio, converted WAV) never outlive their request.
pub struct TempSession {
    id: String,
    dir: PathBuf,
}

impl TempSession {
    /// Create a fresh session directory under `temp_root`
    pub fn create(temp_root: &Path) -> Result<Self> {
        let id = Uuid::new_v4().to_string();
        let dir = temp_root.join(&id);

        std::fs::create_dir_all(&dir).map_err(|e| {
            CntubeError::file_system(format!(
                "Failed to create session directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        debug!(session = %id, dir = %dir.display(), "session directory created");

        Ok(Self { id, dir })
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Session directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a file inside the session directory
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for TempSession {
    fn drop(&mut self) {
        if self.dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.dir) {
                warn!(session = %self.id, "failed to remove session directory: {}", e);
            } else {
                debug!(session = %self.id, "session directory removed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let dir;
        {
            let session = TempSession::create(root.path()).unwrap();
            dir = session.dir().to_path_buf();
            assert!(dir.exists());
            assert!(!session.id().is_empty());
        }
        assert!(!dir.exists());
    }

    #[test]
    fn test_cleanup_removes_files() {
        let root = tempfile::tempdir().unwrap();
        let dir;
        {
            let session = TempSession::create(root.path()).unwrap();
            dir = session.dir().to_path_buf();
            std::fs::write(session.file_path("audio.mp3"), b"data").unwrap();
            std::fs::write(session.file_path("audio.wav"), b"data").unwrap();
        }
        assert!(!dir.exists());
    }

    #[test]
    fn test_sessions_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = TempSession::create(root.path()).unwrap();
        let b = TempSession::create(root.path()).unwrap();
        assert_ne!(a.dir(), b.dir());
    }

    #[test]
    fn test_file_path_is_inside_session() {
        let root = tempfile::tempdir().unwrap();
        let session = TempSession::create(root.path()).unwrap();
        let path = session.file_path("audio.wav");
        assert!(path.starts_with(session.dir()));
    }
}
