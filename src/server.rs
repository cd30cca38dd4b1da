use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use reddit_shorts::assembler::Overrides;
use reddit_shorts::pipeline::{self, Context};
use reddit_shorts::story::{self, Story};
use reddit_shorts::voices;

#[derive(Clone)]
struct AppState {
    ctx: Arc<Context>,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct BackgroundEntry {
    id: String,
    name: String,
    path: String,
    thumbnail: String,
}

#[derive(Serialize)]
struct MusicEntry {
    id: String,
    name: String,
    path: String,
    #[serde(rename = "type")]
    mood: String,
}

#[derive(Deserialize)]
struct GenerateRequest {
    title: String,
    story: String,
    #[serde(default)]
    filter: bool,
    voice: Option<String>,
    background_video: Option<String>,
    background_music: Option<String>,
}

async fn list_voices() -> Json<Vec<voices::VoiceInfo>> {
    Json(voices::listed())
}

async fn list_backgrounds(State(state): State<AppState>) -> Json<Vec<BackgroundEntry>> {
    let entries = state
        .ctx
        .catalog
        .footage
        .iter()
        .filter_map(|path| {
            let file = path.file_name().and_then(OsStr::to_str)?;
            let stem = path.file_stem().and_then(OsStr::to_str)?;
            Some(BackgroundEntry {
                id: file.to_string(),
                name: stem.to_string(),
                path: path.display().to_string(),
                thumbnail: format!("/static/thumbnails/{stem}.jpg"),
            })
        })
        .collect();
    Json(entries)
}

async fn list_music(State(state): State<AppState>) -> Json<Vec<MusicEntry>> {
    let entries = state
        .ctx
        .catalog
        .music
        .iter()
        .filter_map(|track| {
            let file = track.path.file_name().and_then(OsStr::to_str)?;
            let stem = track.path.file_stem().and_then(OsStr::to_str)?;
            Some(MusicEntry {
                id: file.to_string(),
                name: stem.to_string(),
                path: format!("/static/music_assets/{file}"),
                mood: track.mood.to_string(),
            })
        })
        .collect();
    Json(entries)
}

/// Build one short for the submitted story and stream the MP4 back. Each
/// request gets a fresh story id, so concurrent generations do not collide.
async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, ApiError> {
    let title = req.title.trim();
    let body = req.story.trim();
    if title.is_empty() || body.is_empty() {
        return Err(ApiError::BadRequest(
            "Both title and story are required".to_string(),
        ));
    }

    if req.filter {
        let words = &state.ctx.config.profanity;
        if story::contains_profanity(title, words) || story::contains_profanity(body, words) {
            return Err(ApiError::BadRequest(
                "Story contains filtered words".to_string(),
            ));
        }
    }

    let story = Story::new(title.to_string(), body.to_string());
    info!("Generate request: '{}' [{}]", story.title, story.mood);

    let overrides = Overrides {
        footage: req.background_video,
        music: req.background_music,
    };
    let mut rng = StdRng::seed_from_u64(pipeline::now_seed());

    let output = pipeline::run_for_story(
        &state.ctx,
        &story,
        req.voice.as_deref(),
        &overrides,
        &mut rng,
    )
    .await
    .map_err(|err| {
        error!("Generation failed: {err:#}");
        ApiError::Internal(format!("{err:#}"))
    })?;

    let bytes = fs::read(&output)
        .await
        .map_err(|err| ApiError::Internal(format!("Could not read output: {err}")))?;

    let filename = output
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("short.mp4")
        .to_string();
    let headers = [
        (header::CONTENT_TYPE, "video/mp4".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

fn router(state: AppState) -> axum::Router {
    let music_dir = state.ctx.config.music_dir.clone();
    axum::Router::new()
        .route("/api/voices", get(list_voices))
        .route("/api/backgrounds", get(list_backgrounds))
        .route("/api/music", get(list_music))
        .route("/api/generate", post(generate))
        .nest_service("/static/music_assets", ServeDir::new(music_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path =
        std::env::var("SHORTS_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let ctx = match Context::initialize(&config_path).await {
        Ok(ctx) => ctx,
        Err(err) => {
            error!("Startup failed: {err:#}");
            std::process::exit(1);
        }
    };
    info!(
        "Catalog: {} footage, {} music tracks",
        ctx.catalog.footage.len(),
        ctx.catalog.music.len()
    );

    let state = AppState { ctx: Arc::new(ctx) };
    let app = router(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Could not bind {addr}: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {err}");
        std::process::exit(1);
    }
}
