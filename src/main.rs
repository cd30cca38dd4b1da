use clap::Parser;
use reddit_shorts::assembler::Overrides;
use reddit_shorts::pipeline::{self, Context, GenerateOptions};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Generate one narrated short from the local story file.
#[derive(Parser, Debug)]
#[command(name = "reddit-shorts", version, about)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: String,

    /// Skip stories containing the configured profanity list
    #[arg(long)]
    filter: bool,

    /// Seed for story, footage and music selection (wall clock if unset)
    #[arg(long)]
    seed: Option<u64>,

    /// Narration voice code, e.g. en_us_002
    #[arg(long)]
    voice: Option<String>,

    /// Background footage file name (random pick if unset)
    #[arg(long)]
    background: Option<String>,

    /// Music track file name (mood-based pick if unset)
    #[arg(long)]
    music: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let opts = GenerateOptions {
        filter_profanity: cli.filter,
        seed: cli.seed,
        voice: cli.voice,
        overrides: Overrides {
            footage: cli.background,
            music: cli.music,
        },
    };

    let result = match Context::initialize(&cli.config).await {
        Ok(ctx) => pipeline::run_generation(&ctx, &opts).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(path) => println!("Generated: {}", path.display()),
        Err(err) => error!("Generation failed: {err:#}"),
    }
}
