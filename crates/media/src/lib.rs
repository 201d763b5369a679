pub mod assemble;
pub mod probe;

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),
    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),
    #[error("no images to assemble")]
    NoImages,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Paths to the external encoder binaries.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

/// Stitches narration audio and a set of stills into a video file.
#[async_trait::async_trait]
pub trait VideoAssembler: Send + Sync {
    async fn assemble(
        &self,
        images: &[PathBuf],
        audio: &Path,
        output: &Path,
    ) -> Result<(), MediaError>;
}
