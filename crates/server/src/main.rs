use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use finale_genai::gemini::GeminiClient;
use finale_genai::imagen::ImagenClient;
use finale_genai::speech::GoogleSpeechClient;
use finale_imsdb::client::ImsdbClient;
use finale_media::AssemblerConfig;
use finale_media::assemble::FfmpegAssembler;
use finale_server::routes::build_router;
use finale_server::state::AppState;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path = env_or("FINALE_DB", "finale.db");
    let bind = env_or("FINALE_BIND", "0.0.0.0:8000");
    let media_dir = PathBuf::from(env_or("FINALE_MEDIA_DIR", "media"));
    let api_key = std::env::var("FINALE_GEMINI_KEY").context("FINALE_GEMINI_KEY must be set")?;
    let text_model = env_or("FINALE_GEMINI_MODEL", "gemini-2.0-flash");
    let image_model = env_or("FINALE_IMAGE_MODEL", "imagen-3.0-generate-002");
    let default_voice = env_or("FINALE_TTS_VOICE", "en-US-Neural2-D");
    let assembler_config = AssemblerConfig {
        ffmpeg_path: PathBuf::from(env_or("FINALE_FFMPEG", "ffmpeg")),
        ffprobe_path: PathBuf::from(env_or("FINALE_FFPROBE", "ffprobe")),
    };

    let db = finale_db::connect(&db_path)
        .await
        .with_context(|| format!("open database at {db_path}"))?;
    finale_db::migrate::run(&db).await.context("run migrations")?;

    tokio::fs::create_dir_all(&media_dir)
        .await
        .with_context(|| format!("create media dir {}", media_dir.display()))?;

    let state = AppState {
        db,
        scripts: Arc::new(ImsdbClient::new()),
        generator: Arc::new(GeminiClient::new(api_key.clone(), text_model)),
        speech: Arc::new(GoogleSpeechClient::new(api_key.clone())),
        images: Arc::new(ImagenClient::new(api_key, image_model)),
        assembler: Arc::new(FfmpegAssembler::new(assembler_config)),
        media_dir,
        default_voice,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(addr = %bind, "finale server listening");
    axum::serve(listener, app).await.context("serve")?;

    Ok(())
}
