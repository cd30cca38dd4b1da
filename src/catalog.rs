use anyhow::Result;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;

const MUSIC_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];

/// Coarse category driving music selection and mix volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    General,
    Storytime,
    Creepy,
}

impl Mood {
    /// Classify a story's title+body text by keyword.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("creepy") {
            Mood::Creepy
        } else if lower.contains("story") {
            Mood::Storytime
        } else {
            Mood::General
        }
    }

    /// Classify a music file by its name.
    pub fn from_filename(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("storytime") {
            Mood::Storytime
        } else if lower.contains("creepy") {
            Mood::Creepy
        } else {
            Mood::General
        }
    }

    /// Mix volume applied to background music of this mood.
    pub fn music_volume(self) -> f64 {
        match self {
            Mood::General => 0.2,
            Mood::Storytime => 0.35,
            Mood::Creepy => 0.4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::General => "general",
            Mood::Storytime => "storytime",
            Mood::Creepy => "creepy",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MusicTrack {
    pub path: PathBuf,
    pub volume: f64,
    pub mood: Mood,
}

/// Immutable lists of footage and music, scanned once at startup.
#[derive(Debug, Default)]
pub struct Catalog {
    pub footage: Vec<PathBuf>,
    pub music: Vec<MusicTrack>,
}

impl Catalog {
    pub async fn scan(config: &Config) -> Result<Self> {
        let footage = list_regular_files(&config.footage_dir);
        if footage.is_empty() {
            warn!(
                "No footage files found in {}; no video can be produced",
                config.footage_dir.display()
            );
        }

        let mut music = Vec::new();
        for path in list_regular_files(&config.music_dir) {
            let Some(ext) = path.extension().and_then(OsStr::to_str) else {
                continue;
            };
            if !MUSIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
                continue;
            }
            let name = path
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or_default();
            let mood = Mood::from_filename(name);
            music.push(MusicTrack {
                path: path.clone(),
                volume: mood.music_volume(),
                mood,
            });
        }
        if music.is_empty() {
            warn!(
                "No music files found in {}; videos will be narration-only",
                config.music_dir.display()
            );
        }

        Ok(Self { footage, music })
    }

    /// Look up a footage file by its file name, as the web UI refers to it.
    pub fn footage_by_name(&self, name: &str) -> Option<&PathBuf> {
        self.footage
            .iter()
            .find(|p| p.file_name().and_then(OsStr::to_str) == Some(name))
    }

    /// Look up a music track by its file name.
    pub fn music_by_name(&self, name: &str) -> Option<&MusicTrack> {
        self.music
            .iter()
            .find(|t| t.path.file_name().and_then(OsStr::to_str) == Some(name))
    }

    pub fn pick_footage(&self, rng: &mut StdRng) -> Option<&PathBuf> {
        if self.footage.is_empty() {
            return None;
        }
        Some(&self.footage[rng.gen_range(0..self.footage.len())])
    }

    /// Uniform choice among tracks of the given mood, falling back to
    /// "general" and then to the whole catalog when the tag has no tracks.
    pub fn pick_music(&self, mood: Mood, rng: &mut StdRng) -> Option<&MusicTrack> {
        if self.music.is_empty() {
            return None;
        }
        let tagged: Vec<&MusicTrack> = self.music.iter().filter(|t| t.mood == mood).collect();
        let pool = if !tagged.is_empty() {
            tagged
        } else {
            let general: Vec<&MusicTrack> = self
                .music
                .iter()
                .filter(|t| t.mood == Mood::General)
                .collect();
            if !general.is_empty() {
                general
            } else {
                self.music.iter().collect()
            }
        };
        Some(pool[rng.gen_range(0..pool.len())])
    }
}

/// Regular, non-hidden files directly inside a directory. A missing
/// directory is an empty list, not an error.
fn list_regular_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        warn!("Resource directory not found: {}", dir.display());
        return Vec::new();
    }

    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && !entry.file_name().to_string_lossy().starts_with('.')
        })
        .map(|entry| entry.into_path())
        .collect();

    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn track(name: &str, mood: Mood) -> MusicTrack {
        MusicTrack {
            path: PathBuf::from(name),
            volume: mood.music_volume(),
            mood,
        }
    }

    #[test]
    fn filename_keywords_set_mood_and_volume() {
        assert_eq!(Mood::from_filename("Creepy-Ambience.mp3"), Mood::Creepy);
        assert_eq!(Mood::from_filename("storytime_loop.ogg"), Mood::Storytime);
        assert_eq!(Mood::from_filename("chill.wav"), Mood::General);

        assert_eq!(Mood::Creepy.music_volume(), 0.4);
        assert_eq!(Mood::Storytime.music_volume(), 0.35);
        assert_eq!(Mood::General.music_volume(), 0.2);
    }

    #[test]
    fn story_text_keywords_set_mood() {
        assert_eq!(Mood::classify("A Creepy night"), Mood::Creepy);
        assert_eq!(Mood::classify("my storytime tale"), Mood::Storytime);
        assert_eq!(Mood::classify("Hello world."), Mood::General);
        // "creepy" wins when both keywords appear
        assert_eq!(Mood::classify("a creepy story"), Mood::Creepy);
    }

    #[test]
    fn pick_music_prefers_tag_then_falls_back() {
        let catalog = Catalog {
            footage: Vec::new(),
            music: vec![track("general.mp3", Mood::General), track("creepy.mp3", Mood::Creepy)],
        };
        let mut rng = StdRng::seed_from_u64(7);

        let creepy = catalog.pick_music(Mood::Creepy, &mut rng).unwrap();
        assert_eq!(creepy.mood, Mood::Creepy);
        assert_eq!(creepy.volume, 0.4);

        // No storytime tracks: fall back to general
        let fallback = catalog.pick_music(Mood::Storytime, &mut rng).unwrap();
        assert_eq!(fallback.mood, Mood::General);
    }

    #[test]
    fn lookups_match_on_file_name() {
        let catalog = Catalog {
            footage: vec![PathBuf::from("resources/footage/parkour.mp4")],
            music: vec![track("resources/music/creepy_song.mp3", Mood::Creepy)],
        };
        assert!(catalog.footage_by_name("parkour.mp4").is_some());
        assert!(catalog.footage_by_name("missing.mp4").is_none());
        assert_eq!(
            catalog.music_by_name("creepy_song.mp3").unwrap().mood,
            Mood::Creepy
        );
        assert!(catalog.music_by_name("other.mp3").is_none());
    }

    #[test]
    fn pick_music_empty_catalog_is_none() {
        let catalog = Catalog::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(catalog.pick_music(Mood::General, &mut rng).is_none());
        assert!(catalog.pick_footage(&mut rng).is_none());
    }

    #[tokio::test]
    async fn scan_skips_hidden_and_non_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        let footage_dir = dir.path().join("footage");
        let music_dir = dir.path().join("music");
        tokio::fs::create_dir_all(&footage_dir).await.unwrap();
        tokio::fs::create_dir_all(&music_dir).await.unwrap();

        tokio::fs::write(footage_dir.join("clip.mp4"), b"x").await.unwrap();
        tokio::fs::write(footage_dir.join(".DS_Store"), b"x").await.unwrap();
        tokio::fs::write(music_dir.join("creepy_song.mp3"), b"x").await.unwrap();
        tokio::fs::write(music_dir.join("notes.txt"), b"x").await.unwrap();

        let config = Config {
            footage_dir,
            music_dir,
            ..Config::default()
        };
        let catalog = Catalog::scan(&config).await.unwrap();
        assert_eq!(catalog.footage.len(), 1);
        assert_eq!(catalog.music.len(), 1);
        assert_eq!(catalog.music[0].mood, Mood::Creepy);
    }

    #[tokio::test]
    async fn scan_missing_directories_yields_empty_catalog() {
        let config = Config {
            footage_dir: PathBuf::from("missing/footage"),
            music_dir: PathBuf::from("missing/music"),
            ..Config::default()
        };
        let catalog = Catalog::scan(&config).await.unwrap();
        assert!(catalog.footage.is_empty());
        assert!(catalog.music.is_empty());
    }
}
