use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use finale_core::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::pipeline;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/movies/check", post(check_movie))
        .route("/api/v1/movies/{movie}/script", get(movie_script))
        .route("/api/v1/endings", post(generate_ending))
        .route("/api/v1/endings/narrate", post(narrate_ending))
        .route("/api/v1/endings/illustrate", post(illustrate_ending))
        .route("/api/v1/endings/video", post(render_video))
        .route("/media/{kind}/{filename}", get(serve_media))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Reject blank fields up front so upstreams never see empty queries.
fn require(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError(ApiError::BadRequest(format!(
            "{field} is required"
        ))));
    }
    Ok(trimmed.to_string())
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| AppError(ApiError::Internal(format!("database error: {e}"))))?;
    Ok(Json(json!({ "status": "ok" })))
}

#[derive(Deserialize)]
struct CheckRequest {
    movie: String,
}

#[derive(Serialize)]
struct CheckResponse {
    exists: bool,
    movie: String,
}

async fn check_movie(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, AppError> {
    let movie = require("movie", &req.movie)?;

    if !pipeline::movie_exists(&state, &movie).await? {
        return Err(AppError(ApiError::NotFound(format!(
            "no script found for '{movie}'"
        ))));
    }
    Ok(Json(CheckResponse {
        exists: true,
        movie,
    }))
}

#[derive(Serialize)]
struct ScriptResponse {
    movie: String,
    source_url: String,
    script: String,
}

async fn movie_script(
    State(state): State<AppState>,
    Path(movie): Path<String>,
) -> Result<Json<ScriptResponse>, AppError> {
    let movie = require("movie", &movie)?;
    let row = pipeline::get_or_fetch_script(&state, &movie).await?;
    Ok(Json(ScriptResponse {
        movie: row.movie,
        source_url: row.source_url,
        script: row.script,
    }))
}

#[derive(Deserialize)]
struct EndingRequest {
    movie: String,
    prompt: String,
}

async fn generate_ending(
    State(state): State<AppState>,
    Json(req): Json<EndingRequest>,
) -> Result<Json<finale_core::ending::AlternateEnding>, AppError> {
    let movie = require("movie", &req.movie)?;
    let prompt = require("prompt", &req.prompt)?;

    let ending = pipeline::get_or_generate_ending(&state, &movie, &prompt).await?;
    Ok(Json(ending))
}

#[derive(Deserialize)]
struct NarrateRequest {
    movie: String,
    prompt: String,
    voice: Option<String>,
}

#[derive(Serialize)]
struct NarrateResponse {
    movie: String,
    content_hash: String,
    voice: String,
    url: String,
}

async fn narrate_ending(
    State(state): State<AppState>,
    Json(req): Json<NarrateRequest>,
) -> Result<Json<NarrateResponse>, AppError> {
    let movie = require("movie", &req.movie)?;
    let prompt = require("prompt", &req.prompt)?;
    let voice = match req.voice {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => state.default_voice.clone(),
    };

    let row = pipeline::get_or_synthesize_audio(&state, &movie, &prompt, &voice).await?;
    Ok(Json(NarrateResponse {
        movie,
        url: format!("/media/audio/{}.mp3", row.content_hash),
        content_hash: row.content_hash,
        voice: row.voice,
    }))
}

#[derive(Deserialize)]
struct IllustrateRequest {
    movie: String,
    prompt: String,
    count: Option<u32>,
}

#[derive(Serialize)]
struct IllustrateResponse {
    movie: String,
    images: Vec<ImageItem>,
}

#[derive(Serialize)]
struct ImageItem {
    content_hash: String,
    seq: i64,
    url: String,
}

async fn illustrate_ending(
    State(state): State<AppState>,
    Json(req): Json<IllustrateRequest>,
) -> Result<Json<IllustrateResponse>, AppError> {
    let movie = require("movie", &req.movie)?;
    let prompt = require("prompt", &req.prompt)?;
    let count = req.count.unwrap_or(pipeline::DEFAULT_IMAGE_COUNT);
    if count == 0 || count > pipeline::MAX_IMAGE_COUNT {
        return Err(AppError(ApiError::BadRequest(format!(
            "count must be between 1 and {}",
            pipeline::MAX_IMAGE_COUNT
        ))));
    }

    let rows = pipeline::get_or_generate_images(&state, &movie, &prompt, count).await?;
    let images = rows
        .into_iter()
        .map(|r| ImageItem {
            url: format!("/media/images/{}.png", r.content_hash),
            content_hash: r.content_hash,
            seq: r.seq,
        })
        .collect();
    Ok(Json(IllustrateResponse { movie, images }))
}

#[derive(Serialize)]
struct VideoResponse {
    movie: String,
    content_hash: String,
    url: String,
}

async fn render_video(
    State(state): State<AppState>,
    Json(req): Json<EndingRequest>,
) -> Result<Json<VideoResponse>, AppError> {
    let movie = require("movie", &req.movie)?;
    let prompt = require("prompt", &req.prompt)?;

    let row = pipeline::get_or_assemble_video(&state, &movie, &prompt).await?;
    Ok(Json(VideoResponse {
        movie,
        url: format!("/media/video/{}.mp4", row.content_hash),
        content_hash: row.content_hash,
    }))
}

async fn serve_media(
    State(state): State<AppState>,
    Path((kind, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let subdir = match kind.as_str() {
        "audio" | "images" | "video" => kind.as_str(),
        _ => {
            return Err(AppError(ApiError::NotFound(format!(
                "unknown media kind '{kind}'"
            ))));
        }
    };
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(AppError(ApiError::BadRequest("invalid filename".into())));
    }

    let content_type = match std::path::Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some("mp3") => "audio/mpeg",
        Some("png") => "image/png",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    };

    let path = state.media_dir.join(subdir).join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError(ApiError::NotFound(format!("media file '{filename}'"))))?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
