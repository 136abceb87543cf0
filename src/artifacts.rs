//! Artifact layout and atomic file writes.
//!
//! Every artifact of one pipeline run is named after a single base name and
//! lives under a fixed subdirectory of the output root:
//!
//! ```text
//! <root>/images/<base>.png
//! <root>/sounds/<base>.mp3
//! <root>/sounds/silent_audio.mp3
//! <root>/videos/<base>.mp4
//! <root>/videos/<base>_final.mp4
//! ```

use std::path::{Path, PathBuf};

pub const IMAGES_DIR: &str = "images";
pub const SOUNDS_DIR: &str = "sounds";
pub const VIDEOS_DIR: &str = "videos";

/// File name of the silent placeholder track.
pub const SILENT_AUDIO_FILE: &str = "silent_audio.mp3";

/// Errors for artifact naming.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("base name must not be empty")]
    EmptyBaseName,

    #[error("base name '{0}' must not contain path separators")]
    InvalidBaseName(String),
}

/// Output directory layout rooted at a workspace directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

/// Every path produced by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub image: PathBuf,
    pub sound: PathBuf,
    pub silent_audio: PathBuf,
    pub video: PathBuf,
    pub final_video: PathBuf,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    pub fn sounds_dir(&self) -> PathBuf {
        self.root.join(SOUNDS_DIR)
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join(VIDEOS_DIR)
    }

    /// Derive all artifact paths for `base`.
    pub fn paths_for(&self, base: &str) -> Result<ArtifactPaths, ArtifactError> {
        let base = validate_base_name(base)?;
        Ok(ArtifactPaths {
            image: self.images_dir().join(format!("{}.png", base)),
            sound: self.sounds_dir().join(format!("{}.mp3", base)),
            silent_audio: self.sounds_dir().join(SILENT_AUDIO_FILE),
            video: self.videos_dir().join(format!("{}.mp4", base)),
            final_video: self.videos_dir().join(format!("{}_final.mp4", base)),
        })
    }

    /// Create the images/sounds/videos directories.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [self.images_dir(), self.sounds_dir(), self.videos_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}

fn validate_base_name(base: &str) -> Result<&str, ArtifactError> {
    let base = base.trim();
    if base.is_empty() {
        return Err(ArtifactError::EmptyBaseName);
    }
    if base.contains('/') || base.contains('\\') || base == "." || base == ".." {
        return Err(ArtifactError::InvalidBaseName(base.to_string()));
    }
    Ok(base)
}

/// Temporary sibling path used while `path` is being written.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Write `bytes` to `path` without ever exposing a half-written file.
///
/// Creates parent directories, writes to a `.part` sibling, then renames.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = partial_path(path);
    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    tokio::fs::rename(&tmp, path).await
}
