//! End-to-end handler tests with every upstream stubbed out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::StatusCode;
use axum_test::TestServer;
use finale_genai::GenAiError;
use finale_genai::provider::{EndingGenerator, ImageGenerator, SpeechSynthesizer};
use finale_imsdb::{FetchedScript, ScrapeError, ScriptSource};
use finale_media::{MediaError, VideoAssembler};
use finale_server::routes::build_router;
use finale_server::state::AppState;
use serde_json::{Value, json};
use tempfile::TempDir;

const KNOWN_MOVIE: &str = "The Matrix";
const SCRIPT_TEXT: &str = "INT. HOTEL ROOM - NIGHT\nTrinity waits in the dark.";

const GENERATED: &str = "=== Alternate Ending ===\n\
    *Visual*: Neo walks out of the phone booth into green rain.\n\
    *Narration*: The machines never saw him coming.\n\
    *Dialogue*: NEO: \"I'm done running.\"\n\
    *Notes*: Single continuous take.";

struct StubScripts {
    fetches: AtomicUsize,
}

#[async_trait::async_trait]
impl ScriptSource for StubScripts {
    async fn check(&self, movie: &str) -> Result<bool, ScrapeError> {
        Ok(movie == KNOWN_MOVIE)
    }

    async fn fetch_script(&self, movie: &str) -> Result<FetchedScript, ScrapeError> {
        if movie != KNOWN_MOVIE {
            return Err(ScrapeError::NotFound);
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(FetchedScript {
            text: SCRIPT_TEXT.to_string(),
            source_url: "https://imsdb.example/scripts/The-Matrix.html".to_string(),
        })
    }
}

struct StubGenerator {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait::async_trait]
impl EndingGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate_ending(
        &self,
        _movie: &str,
        _prompt: &str,
        _script: &str,
    ) -> Result<String, GenAiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GenAiError::Provider("model unavailable".into()));
        }
        Ok(GENERATED.to_string())
    }
}

struct StubSpeech {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>, GenAiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(b"ID3 fake mp3 bytes".to_vec())
    }
}

struct StubImages {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ImageGenerator for StubImages {
    async fn generate(&self, _prompt: &str, count: u32) -> Result<Vec<Vec<u8>>, GenAiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..count)
            .map(|i| format!("png frame {i}").into_bytes())
            .collect())
    }
}

struct StubAssembler {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl VideoAssembler for StubAssembler {
    async fn assemble(
        &self,
        images: &[PathBuf],
        _audio: &Path,
        output: &Path,
    ) -> Result<(), MediaError> {
        assert!(!images.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::fs::write(output, b"fake mp4")?;
        Ok(())
    }
}

struct Stubs {
    scripts: Arc<StubScripts>,
    generator: Arc<StubGenerator>,
    speech: Arc<StubSpeech>,
    images: Arc<StubImages>,
    assembler: Arc<StubAssembler>,
}

impl Stubs {
    fn new(generator_fails: bool) -> Self {
        Self {
            scripts: Arc::new(StubScripts {
                fetches: AtomicUsize::new(0),
            }),
            generator: Arc::new(StubGenerator {
                calls: AtomicUsize::new(0),
                fail: generator_fails,
            }),
            speech: Arc::new(StubSpeech {
                calls: AtomicUsize::new(0),
            }),
            images: Arc::new(StubImages {
                calls: AtomicUsize::new(0),
            }),
            assembler: Arc::new(StubAssembler {
                calls: AtomicUsize::new(0),
            }),
        }
    }
}

async fn test_app(generator_fails: bool) -> (TestServer, Stubs, TempDir) {
    let db = finale_db::connect(":memory:").await.unwrap();
    finale_db::migrate::run(&db).await.unwrap();
    let media = TempDir::new().unwrap();

    let stubs = Stubs::new(generator_fails);
    let state = AppState {
        db,
        scripts: stubs.scripts.clone(),
        generator: stubs.generator.clone(),
        speech: stubs.speech.clone(),
        images: stubs.images.clone(),
        assembler: stubs.assembler.clone(),
        media_dir: media.path().to_path_buf(),
        default_voice: "en-US-Neural2-D".to_string(),
    };

    let server = TestServer::new(build_router(state)).unwrap();
    (server, stubs, media)
}

#[tokio::test]
async fn health_reports_ok() {
    let (server, _stubs, _media) = test_app(false).await;
    let res = server.get("/health").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn check_finds_known_movie() {
    let (server, _stubs, _media) = test_app(false).await;
    let res = server
        .post("/api/v1/movies/check")
        .json(&json!({ "movie": KNOWN_MOVIE }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body = res.json::<Value>();
    assert_eq!(body["exists"], true);
    assert_eq!(body["movie"], KNOWN_MOVIE);
}

#[tokio::test]
async fn check_unknown_movie_is_404() {
    let (server, _stubs, _media) = test_app(false).await;
    let res = server
        .post("/api/v1/movies/check")
        .json(&json!({ "movie": "Definitely Not A Movie" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn blank_movie_is_rejected() {
    let (server, _stubs, _media) = test_app(false).await;
    let res = server
        .post("/api/v1/movies/check")
        .json(&json!({ "movie": "   " }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>()["error"]["code"], "bad_request");
}

#[tokio::test]
async fn script_is_fetched_once_then_served_from_cache() {
    let (server, stubs, _media) = test_app(false).await;

    for _ in 0..2 {
        let res = server.get("/api/v1/movies/The%20Matrix/script").await;
        assert_eq!(res.status_code(), StatusCode::OK);
        let body = res.json::<Value>();
        assert_eq!(body["movie"], KNOWN_MOVIE);
        assert_eq!(body["script"], SCRIPT_TEXT);
        assert!(body["source_url"].as_str().unwrap().contains("imsdb"));
    }

    assert_eq!(stubs.scripts.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ending_is_generated_once_and_split_into_segments() {
    let (server, stubs, _media) = test_app(false).await;
    let req = json!({ "movie": KNOWN_MOVIE, "prompt": "Neo refuses the red pill" });

    let first = server.post("/api/v1/endings").json(&req).await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let body = first.json::<Value>();
    assert_eq!(body["movie"], KNOWN_MOVIE);
    assert_eq!(
        body["visual_description"],
        "Neo walks out of the phone booth into green rain."
    );
    assert_eq!(body["narration_text"], "The machines never saw him coming.");
    assert_eq!(body["character_dialogue"], "NEO: \"I'm done running.\"");
    assert_eq!(body["production_notes"], "Single continuous take.");

    let second = server.post("/api/v1/endings").json(&req).await;
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(second.json::<Value>()["narration_text"], body["narration_text"]);

    assert_eq!(stubs.generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn different_prompts_generate_separately() {
    let (server, stubs, _media) = test_app(false).await;

    for prompt in ["agents win", "oracle was wrong"] {
        let res = server
            .post("/api/v1/endings")
            .json(&json!({ "movie": KNOWN_MOVIE, "prompt": prompt }))
            .await;
        assert_eq!(res.status_code(), StatusCode::OK);
    }

    assert_eq!(stubs.generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn ending_for_unknown_movie_is_404() {
    let (server, _stubs, _media) = test_app(false).await;
    let res = server
        .post("/api/v1/endings")
        .json(&json!({ "movie": "Nope", "prompt": "anything" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generator_failure_surfaces_as_upstream_error() {
    let (server, _stubs, _media) = test_app(true).await;
    let res = server
        .post("/api/v1/endings")
        .json(&json!({ "movie": KNOWN_MOVIE, "prompt": "anything" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.json::<Value>()["error"]["code"], "upstream_error");
}

#[tokio::test]
async fn narration_audio_is_written_and_cached() {
    let (server, stubs, media) = test_app(false).await;
    let req = json!({ "movie": KNOWN_MOVIE, "prompt": "Neo stays" });

    let first = server.post("/api/v1/endings/narrate").json(&req).await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let body = first.json::<Value>();
    let hash = body["content_hash"].as_str().unwrap().to_string();
    assert_eq!(body["voice"], "en-US-Neural2-D");
    assert_eq!(body["url"], format!("/media/audio/{hash}.mp3"));
    assert!(media.path().join("audio").join(format!("{hash}.mp3")).exists());

    let second = server.post("/api/v1/endings/narrate").json(&req).await;
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(second.json::<Value>()["content_hash"], hash.as_str());

    assert_eq!(stubs.speech.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn different_voice_synthesizes_again() {
    let (server, stubs, _media) = test_app(false).await;

    let a = server
        .post("/api/v1/endings/narrate")
        .json(&json!({ "movie": KNOWN_MOVIE, "prompt": "Neo stays" }))
        .await;
    let b = server
        .post("/api/v1/endings/narrate")
        .json(&json!({ "movie": KNOWN_MOVIE, "prompt": "Neo stays", "voice": "en-US-Neural2-A" }))
        .await;

    assert_ne!(
        a.json::<Value>()["content_hash"],
        b.json::<Value>()["content_hash"]
    );
    assert_eq!(stubs.speech.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stills_are_generated_once_per_description() {
    let (server, stubs, media) = test_app(false).await;
    let req = json!({ "movie": KNOWN_MOVIE, "prompt": "Neo stays", "count": 2 });

    let first = server.post("/api/v1/endings/illustrate").json(&req).await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let body = first.json::<Value>();
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    for (i, item) in images.iter().enumerate() {
        assert_eq!(item["seq"], i as i64);
        let hash = item["content_hash"].as_str().unwrap();
        assert_eq!(item["url"], format!("/media/images/{hash}.png"));
        assert!(media.path().join("images").join(format!("{hash}.png")).exists());
    }

    let second = server.post("/api/v1/endings/illustrate").json(&req).await;
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(stubs.images.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn illustrate_count_is_bounded() {
    let (server, _stubs, _media) = test_app(false).await;
    let res = server
        .post("/api/v1/endings/illustrate")
        .json(&json!({ "movie": KNOWN_MOVIE, "prompt": "p", "count": 99 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn video_is_assembled_once_and_cached() {
    let (server, stubs, media) = test_app(false).await;
    let req = json!({ "movie": KNOWN_MOVIE, "prompt": "Neo stays" });

    let first = server.post("/api/v1/endings/video").json(&req).await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let body = first.json::<Value>();
    let hash = body["content_hash"].as_str().unwrap().to_string();
    assert_eq!(body["url"], format!("/media/video/{hash}.mp4"));
    assert!(media.path().join("video").join(format!("{hash}.mp4")).exists());

    let second = server.post("/api/v1/endings/video").json(&req).await;
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(second.json::<Value>()["content_hash"], hash.as_str());

    assert_eq!(stubs.assembler.calls.load(Ordering::SeqCst), 1);
    // Ingredients were produced exactly once too
    assert_eq!(stubs.speech.calls.load(Ordering::SeqCst), 1);
    assert_eq!(stubs.images.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn media_files_are_served_with_content_type() {
    let (server, _stubs, _media) = test_app(false).await;

    let narrate = server
        .post("/api/v1/endings/narrate")
        .json(&json!({ "movie": KNOWN_MOVIE, "prompt": "Neo stays" }))
        .await;
    let url = narrate.json::<Value>()["url"].as_str().unwrap().to_string();

    let res = server.get(&url).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "audio/mpeg");
    assert_eq!(res.as_bytes().as_ref(), b"ID3 fake mp3 bytes");
}

#[tokio::test]
async fn media_path_traversal_is_rejected() {
    let (server, _stubs, _media) = test_app(false).await;

    let res = server.get("/media/audio/..%2Fsecret.mp3").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = server.get("/media/passwords/x.mp3").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server.get("/media/audio/missing.mp3").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}
