use anyhow::{Context, Result};
use tokio::fs;
use tokio::process::Command;
use tracing::warn;

use crate::config::Config;

/// Create the working directories named by the configuration. Resource
/// directories are created too so a fresh checkout shows where assets go.
pub async fn ensure_directories(config: &Config) -> Result<()> {
    for dir in [
        &config.footage_dir,
        &config.music_dir,
        &config.images_dir,
        &config.output_dir,
        &config.temp_dir,
    ] {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create dir {}", dir.display()))?;
    }
    Ok(())
}

/// Probe for the external tools assembly shells out to. Missing ffmpeg is
/// fatal later, missing whisper only costs the captions, so both are just
/// warned about here.
pub async fn check_tools() {
    if !tool_responds("ffmpeg", "-version").await {
        warn!("ffmpeg not found on PATH; video assembly will fail");
    }
    if !tool_responds("whisper", "--help").await {
        warn!("whisper not found on PATH; shorts will have no captions");
    }
}

async fn tool_responds(name: &str, arg: &str) -> bool {
    Command::new(name)
        .arg(arg)
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn ensure_directories_creates_the_full_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let config = Config {
            footage_dir: root.join("resources/footage"),
            music_dir: root.join("resources/music"),
            images_dir: root.join("resources/images"),
            output_dir: root.join("generated_shorts"),
            temp_dir: root.join("temp"),
            ..Config::default()
        };

        ensure_directories(&config).await.unwrap();
        for path in [
            config.footage_dir,
            config.music_dir,
            config.images_dir,
            config.output_dir,
            config.temp_dir,
        ] {
            assert!(path.is_dir(), "{} missing", path.display());
        }
    }

    #[tokio::test]
    async fn ensure_directories_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            footage_dir: dir.path().join("f"),
            music_dir: dir.path().join("m"),
            images_dir: dir.path().join("i"),
            output_dir: dir.path().join("o"),
            temp_dir: dir.path().join("t"),
            stories_file: PathBuf::from("stories.txt"),
            ..Config::default()
        };
        ensure_directories(&config).await.unwrap();
        ensure_directories(&config).await.unwrap();
    }
}
