use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::catalog::Mood;
use crate::voices;

/// Project configuration, loaded from `config.json`. Every field has a
/// default so a missing or partial file still yields a usable setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_stories_file")]
    pub stories_file: PathBuf,
    #[serde(default = "default_footage_dir")]
    pub footage_dir: PathBuf,
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    #[serde(default = "default_font_file")]
    pub font_file: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_voice")]
    pub default_voice: String,
    #[serde(default = "default_profanity")]
    pub profanity: Vec<String>,
}

fn default_stories_file() -> PathBuf {
    PathBuf::from("stories.txt")
}

fn default_footage_dir() -> PathBuf {
    PathBuf::from("resources/footage")
}

fn default_music_dir() -> PathBuf {
    PathBuf::from("resources/music")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("resources/images")
}

fn default_font_file() -> PathBuf {
    PathBuf::from("resources/fonts/Montserrat-ExtraBold.ttf")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated_shorts")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_voice() -> String {
    voices::DEFAULT_VOICE.to_string()
}

fn default_profanity() -> Vec<String> {
    ["porn", "fuck", "fucking"]
        .iter()
        .map(|w| w.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stories_file: default_stories_file(),
            footage_dir: default_footage_dir(),
            music_dir: default_music_dir(),
            images_dir: default_images_dir(),
            font_file: default_font_file(),
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
            default_voice: default_voice(),
            profanity: default_profanity(),
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?,
            Err(_) => {
                info!("No config at {}; using defaults", path.display());
                Config::default()
            }
        };
        Ok(config)
    }

    /// Temp directory scoped to one assembly job.
    pub fn job_temp_dir(&self, story_id: &str) -> PathBuf {
        let name = if story_id.is_empty() { "short" } else { story_id };
        self.temp_dir.join(name)
    }

    /// Where rendered title cards land, keyed by story id.
    pub fn title_card_path(&self, story_id: &str) -> PathBuf {
        self.temp_dir.join("images").join(format!("{story_id}.png"))
    }

    pub fn template_path(&self) -> PathBuf {
        self.images_dir.join("reddit_submission_template.png")
    }

    pub fn badge_path(&self, mood: Mood) -> PathBuf {
        self.images_dir.join("badges").join(format!("{mood}.png"))
    }

    pub fn default_badge_path(&self) -> PathBuf {
        self.images_dir.join("badges").join("default.png")
    }

    pub fn output_path(&self, story_id: &str) -> PathBuf {
        let name = if story_id.is_empty() { "short" } else { story_id };
        self.output_dir.join(format!("{name}.mp4"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let config = Config::load("definitely/not/here.json").await.unwrap();
        assert_eq!(config.stories_file, PathBuf::from("stories.txt"));
        assert_eq!(config.default_voice, voices::DEFAULT_VOICE);
        assert!(config.profanity.contains(&"porn".to_string()));
    }

    #[tokio::test]
    async fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"output_dir": "videos"}"#)
            .await
            .unwrap();

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.output_dir, PathBuf::from("videos"));
        assert_eq!(config.temp_dir, PathBuf::from("temp"));
    }

    #[test]
    fn job_paths_use_fallback_name_for_empty_id() {
        let config = Config::default();
        assert_eq!(config.output_path(""), PathBuf::from("generated_shorts/short.mp4"));
        assert_eq!(config.job_temp_dir(""), PathBuf::from("temp/short"));
        assert_eq!(
            config.output_path("abc123"),
            PathBuf::from("generated_shorts/abc123.mp4")
        );
    }
}
