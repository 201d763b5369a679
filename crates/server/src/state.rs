use std::path::PathBuf;
use std::sync::Arc;

use finale_genai::provider::{EndingGenerator, ImageGenerator, SpeechSynthesizer};
use finale_imsdb::ScriptSource;
use finale_media::VideoAssembler;
use sqlx::SqlitePool;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub scripts: Arc<dyn ScriptSource>,
    pub generator: Arc<dyn EndingGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub images: Arc<dyn ImageGenerator>,
    pub assembler: Arc<dyn VideoAssembler>,
    /// Root directory for generated artifacts (audio/, images/, video/).
    pub media_dir: PathBuf,
    pub default_voice: String,
}
