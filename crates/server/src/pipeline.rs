//! Cache-or-compute orchestration for each artifact stage.
//!
//! Every stage checks its cache table first and only calls the upstream when
//! the entry is missing. Generated files land under the media directory and
//! are keyed by content hash, so reruns with identical inputs are free.

use std::path::{Path, PathBuf};

use finale_core::ending::AlternateEnding;
use finale_core::error::ApiError;
use finale_db::repo;
use finale_genai::{GenAiError, retry};
use finale_imsdb::ScrapeError;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::state::AppState;

pub const DEFAULT_IMAGE_COUNT: u32 = 4;
pub const MAX_IMAGE_COUNT: u32 = 8;

/// Hex SHA-256 over the given parts. A NUL separator keeps part boundaries
/// from colliding (`["ab", "c"]` vs `["a", "bc"]`).
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn db_err(e: sqlx::Error) -> ApiError {
    ApiError::Internal(format!("database error: {e}"))
}

fn io_err(e: std::io::Error) -> ApiError {
    ApiError::Internal(format!("io error: {e}"))
}

fn scrape_err(movie: &str, e: ScrapeError) -> ApiError {
    match e {
        ScrapeError::NotFound => ApiError::NotFound(format!("no script found for '{movie}'")),
        ScrapeError::Network(m) => ApiError::Upstream(format!("script source unreachable: {m}")),
    }
}

fn genai_err(what: &str, e: GenAiError) -> ApiError {
    ApiError::Upstream(format!("{what} failed: {e}"))
}

/// True when a screenplay is available, checking the cache before the site.
pub async fn movie_exists(state: &AppState, movie: &str) -> Result<bool, ApiError> {
    if repo::scripts::get(&state.db, movie)
        .await
        .map_err(db_err)?
        .is_some()
    {
        return Ok(true);
    }
    state
        .scripts
        .check(movie)
        .await
        .map_err(|e| scrape_err(movie, e))
}

pub async fn get_or_fetch_script(
    state: &AppState,
    movie: &str,
) -> Result<repo::scripts::ScriptRow, ApiError> {
    if let Some(row) = repo::scripts::get(&state.db, movie).await.map_err(db_err)? {
        return Ok(row);
    }

    let fetched = state
        .scripts
        .fetch_script(movie)
        .await
        .map_err(|e| scrape_err(movie, e))?;
    repo::scripts::put(&state.db, movie, &fetched.text, &fetched.source_url)
        .await
        .map_err(db_err)?;
    info!(movie, url = %fetched.source_url, "script cached");

    repo::scripts::get(&state.db, movie)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ApiError::Internal("script row missing after insert".into()))
}

pub async fn get_or_generate_ending(
    state: &AppState,
    movie: &str,
    prompt: &str,
) -> Result<AlternateEnding, ApiError> {
    if let Some(row) = repo::endings::get(&state.db, movie, prompt)
        .await
        .map_err(db_err)?
    {
        let ending: AlternateEnding = serde_json::from_str(&row.ending_json)
            .map_err(|e| ApiError::Internal(format!("corrupt cached ending: {e}")))?;
        return Ok(ending);
    }

    let script = get_or_fetch_script(state, movie).await?;

    let raw = retry::with_backoff("generate_ending", || {
        state.generator.generate_ending(movie, prompt, &script.script)
    })
    .await
    .map_err(|e| genai_err("ending generation", e))?;

    let ending = AlternateEnding::from_generated(movie, &raw);
    let json = serde_json::to_string(&ending)
        .map_err(|e| ApiError::Internal(format!("serialize ending: {e}")))?;
    repo::endings::put(&state.db, movie, prompt, &json)
        .await
        .map_err(db_err)?;
    info!(movie, generator = state.generator.name(), "ending cached");

    Ok(ending)
}

pub async fn get_or_synthesize_audio(
    state: &AppState,
    movie: &str,
    prompt: &str,
    voice: &str,
) -> Result<repo::audio::AudioRow, ApiError> {
    let ending = get_or_generate_ending(state, movie, prompt).await?;
    let hash = content_hash(&[&ending.narration_text, voice]);

    if let Some(row) = repo::audio::get(&state.db, &hash).await.map_err(db_err)? {
        return Ok(row);
    }

    let bytes = retry::with_backoff("synthesize_speech", || {
        state.speech.synthesize(&ending.narration_text, voice)
    })
    .await
    .map_err(|e| genai_err("speech synthesis", e))?;

    let dir = state.media_dir.join("audio");
    tokio::fs::create_dir_all(&dir).await.map_err(io_err)?;
    let path = dir.join(format!("{hash}.mp3"));
    tokio::fs::write(&path, &bytes).await.map_err(io_err)?;

    let path_str = path.to_string_lossy().into_owned();
    repo::audio::put(&state.db, &hash, movie, prompt, voice, &path_str)
        .await
        .map_err(db_err)?;
    info!(movie, hash = %hash, bytes = bytes.len(), "narration audio cached");

    repo::audio::get(&state.db, &hash)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ApiError::Internal("audio row missing after insert".into()))
}

/// Fetch or generate `count` stills for the ending's visual description.
/// Individual stills are keyed by description and sequence number; a partial
/// cache regenerates the whole set so the stills come from one batch.
pub async fn get_or_generate_images(
    state: &AppState,
    movie: &str,
    prompt: &str,
    count: u32,
) -> Result<Vec<repo::images::ImageRow>, ApiError> {
    let ending = get_or_generate_ending(state, movie, prompt).await?;
    let visual = ending.visual_description.as_str();

    let hashes: Vec<String> = (0..count)
        .map(|seq| content_hash(&[visual, &seq.to_string()]))
        .collect();

    let mut rows = Vec::with_capacity(count as usize);
    for hash in &hashes {
        match repo::images::get(&state.db, hash).await.map_err(db_err)? {
            Some(row) => rows.push(row),
            None => break,
        }
    }
    if rows.len() == count as usize {
        return Ok(rows);
    }

    let frames = retry::with_backoff("generate_images", || state.images.generate(visual, count))
        .await
        .map_err(|e| genai_err("image generation", e))?;
    if frames.len() < count as usize {
        return Err(ApiError::Upstream(format!(
            "image provider returned {} of {count} stills",
            frames.len()
        )));
    }

    let dir = state.media_dir.join("images");
    tokio::fs::create_dir_all(&dir).await.map_err(io_err)?;

    rows.clear();
    for (seq, (hash, bytes)) in hashes.iter().zip(frames).enumerate() {
        let path = dir.join(format!("{hash}.png"));
        tokio::fs::write(&path, &bytes).await.map_err(io_err)?;

        let path_str = path.to_string_lossy().into_owned();
        repo::images::put(&state.db, hash, movie, prompt, seq as i64, &path_str)
            .await
            .map_err(db_err)?;
        rows.push(
            repo::images::get(&state.db, hash)
                .await
                .map_err(db_err)?
                .ok_or_else(|| ApiError::Internal("image row missing after insert".into()))?,
        );
    }
    info!(movie, count, "ending stills cached");

    Ok(rows)
}

/// Assemble (or reuse) the narrated slideshow for an ending. The video is
/// keyed by the hashes of its ingredients, so it is rebuilt only when the
/// audio or any still changes.
pub async fn get_or_assemble_video(
    state: &AppState,
    movie: &str,
    prompt: &str,
) -> Result<repo::videos::VideoRow, ApiError> {
    let audio = get_or_synthesize_audio(state, movie, prompt, &state.default_voice).await?;
    let images = get_or_generate_images(state, movie, prompt, DEFAULT_IMAGE_COUNT).await?;

    let mut parts: Vec<&str> = vec![audio.content_hash.as_str()];
    parts.extend(images.iter().map(|r| r.content_hash.as_str()));
    let hash = content_hash(&parts);

    if let Some(row) = repo::videos::get(&state.db, &hash).await.map_err(db_err)? {
        return Ok(row);
    }

    let dir = state.media_dir.join("video");
    tokio::fs::create_dir_all(&dir).await.map_err(io_err)?;
    let output = dir.join(format!("{hash}.mp4"));

    let image_paths: Vec<PathBuf> = images.iter().map(|r| PathBuf::from(&r.path)).collect();
    state
        .assembler
        .assemble(&image_paths, Path::new(&audio.path), &output)
        .await
        .map_err(|e| ApiError::Internal(format!("video assembly failed: {e}")))?;

    let path_str = output.to_string_lossy().into_owned();
    repo::videos::put(&state.db, &hash, movie, prompt, &path_str)
        .await
        .map_err(db_err)?;
    info!(movie, hash = %hash, "ending video cached");

    repo::videos::get(&state.db, &hash)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ApiError::Internal("video row missing after insert".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        let a = content_hash(&["narration", "en-US-Neural2-D"]);
        let b = content_hash(&["narration", "en-US-Neural2-D"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn content_hash_separates_part_boundaries() {
        assert_ne!(content_hash(&["ab", "c"]), content_hash(&["a", "bc"]));
        assert_ne!(content_hash(&["x"]), content_hash(&["x", ""]));
    }
}
