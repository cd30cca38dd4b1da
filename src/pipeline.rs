use anyhow::{Context as _, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::info;

use crate::assembler;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::init;
use crate::story::{self, Story, StorySession};
use crate::voices;

/// Everything a generation run needs, built once at startup. No globals;
/// both binaries thread this through explicitly.
pub struct Context {
    pub config: Config,
    pub catalog: Catalog,
    pub client: Client,
}

impl Context {
    pub async fn initialize<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config = Config::load(config_path).await?;
        init::ensure_directories(&config).await?;
        init::check_tools().await;
        let catalog = Catalog::scan(&config).await?;
        let client = Client::new();
        Ok(Self {
            config,
            catalog,
            client,
        })
    }
}

/// Knobs for a CLI generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Skip stories containing configured profanity instead of narrating them.
    pub filter_profanity: bool,
    /// Fixed seed for story/footage/music selection; unset means wall clock.
    pub seed: Option<u64>,
    /// Voice code override; unset means the configured default.
    pub voice: Option<String>,
    /// Caller-requested footage/music file names.
    pub overrides: assembler::Overrides,
}

pub fn now_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Pick one story from the configured story file and produce a short for it.
pub async fn run_generation(ctx: &Context, opts: &GenerateOptions) -> Result<PathBuf> {
    let text = fs::read_to_string(&ctx.config.stories_file)
        .await
        .with_context(|| {
            format!(
                "Failed to read story file {}",
                ctx.config.stories_file.display()
            )
        })?;
    let stories = story::parse_stories(&text);
    if stories.is_empty() {
        anyhow::bail!(
            "No usable stories in {}",
            ctx.config.stories_file.display()
        );
    }
    info!("Parsed {} stories", stories.len());

    let mut rng = StdRng::seed_from_u64(opts.seed.unwrap_or_else(now_seed));
    let mut session = StorySession::new();
    let profanity = opts
        .filter_profanity
        .then(|| ctx.config.profanity.as_slice());
    let chosen = session
        .pick(&stories, profanity, &mut rng)
        .context("Every story was rejected by the profanity filter")?;

    run_for_story(ctx, chosen, opts.voice.as_deref(), &opts.overrides, &mut rng).await
}

/// Assemble one already-chosen story, as the web endpoint does.
pub async fn run_for_story(
    ctx: &Context,
    story: &Story,
    voice: Option<&str>,
    overrides: &assembler::Overrides,
    rng: &mut StdRng,
) -> Result<PathBuf> {
    let voice = match voice {
        Some(code) => voices::resolve(Some(code)),
        None => voices::resolve(Some(ctx.config.default_voice.as_str())),
    };
    assembler::assemble(
        &ctx.config,
        &ctx.catalog,
        &ctx.client,
        voice,
        story,
        overrides,
        rng,
    )
    .await
}
