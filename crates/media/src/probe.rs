use std::path::Path;

use crate::MediaError;

/// Run ffprobe on a file and return its duration in seconds.
pub async fn probe_duration(ffprobe_path: &Path, file: &Path) -> Result<f64, MediaError> {
    let output = tokio::process::Command::new(ffprobe_path)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(file)
        .output()
        .await
        .map_err(|e| MediaError::ProbeFailed(format!("spawn failed: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::ProbeFailed(stderr.into_owned()));
    }

    let raw: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| MediaError::ProbeFailed(format!("parse JSON: {e}")))?;

    parse_duration(&raw)
}

fn parse_duration(raw: &serde_json::Value) -> Result<f64, MediaError> {
    raw.get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| MediaError::ProbeFailed("missing 'format.duration'".into()))
}
