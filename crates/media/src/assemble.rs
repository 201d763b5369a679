use std::path::{Path, PathBuf};

use tracing::info;

use crate::probe::probe_duration;
use crate::{AssemblerConfig, MediaError, VideoAssembler};

/// Assembles a narrated slideshow with an external ffmpeg binary.
pub struct FfmpegAssembler {
    config: AssemblerConfig,
}

impl FfmpegAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl VideoAssembler for FfmpegAssembler {
    /// Stitch `images` into a slideshow timed to cover `audio`, muxing the
    /// narration in. Each still is shown for an equal share of the audio.
    async fn assemble(
        &self,
        images: &[PathBuf],
        audio: &Path,
        output: &Path,
    ) -> Result<(), MediaError> {
        if images.is_empty() {
            return Err(MediaError::NoImages);
        }

        let audio_secs = probe_duration(&self.config.ffprobe_path, audio).await?;
        let per_image_secs = audio_secs / images.len() as f64;

        let manifest = build_concat_manifest(images, per_image_secs);
        let manifest_path = output.with_extension("ffconcat");
        tokio::fs::write(&manifest_path, &manifest).await?;

        let result = run_ffmpeg(&self.config.ffmpeg_path, &manifest_path, audio, output).await;

        // The manifest is only needed during the encode
        let _ = tokio::fs::remove_file(&manifest_path).await;

        result
    }
}

/// Build an ffconcat manifest showing each image for `per_image_secs`. The
/// last image is listed twice: the concat demuxer drops the final duration
/// directive otherwise.
pub fn build_concat_manifest(images: &[PathBuf], per_image_secs: f64) -> String {
    let mut manifest = String::from("ffconcat version 1.0\n");
    for image in images {
        manifest.push_str(&format!(
            "file '{}'\nduration {:.3}\n",
            image.display(),
            per_image_secs
        ));
    }
    if let Some(last) = images.last() {
        manifest.push_str(&format!("file '{}'\n", last.display()));
    }
    manifest
}

async fn run_ffmpeg(
    ffmpeg_path: &Path,
    manifest: &Path,
    audio: &Path,
    output: &Path,
) -> Result<(), MediaError> {
    let args: Vec<String> = vec![
        "-hide_banner".into(),
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        manifest.to_string_lossy().into_owned(),
        "-i".into(),
        audio.to_string_lossy().into_owned(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "veryfast".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-r".into(),
        "30".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "128k".into(),
        "-shortest".into(),
        output.to_string_lossy().into_owned(),
    ];

    let result = tokio::process::Command::new(ffmpeg_path)
        .args(&args)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| MediaError::FfmpegFailed(format!("spawn: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(MediaError::FfmpegFailed(stderr.into_owned()));
    }

    info!(output = %output.display(), "video assembled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lists_every_image_with_duration() {
        let images = vec![PathBuf::from("/m/a.png"), PathBuf::from("/m/b.png")];
        let manifest = build_concat_manifest(&images, 2.5);

        assert!(manifest.starts_with("ffconcat version 1.0\n"));
        assert_eq!(manifest.matches("duration 2.500").count(), 2);
        assert_eq!(manifest.matches("file '/m/a.png'").count(), 1);
        // Last image repeated so its duration directive takes effect
        assert_eq!(manifest.matches("file '/m/b.png'").count(), 2);
        assert!(manifest.ends_with("file '/m/b.png'\n"));
    }

    #[test]
    fn manifest_for_single_image() {
        let images = vec![PathBuf::from("still.png")];
        let manifest = build_concat_manifest(&images, 10.0);
        assert_eq!(manifest.matches("file 'still.png'").count(), 2);
        assert_eq!(manifest.matches("duration 10.000").count(), 1);
    }
}
