use anyhow::{Context, Result};
use rand::Rng;
use rand::rngs::StdRng;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::catalog::{Catalog, MusicTrack};
use crate::config::Config;
use crate::ffmpeg::{self, FootagePlan, RenderSpec};
use crate::story::Story;
use crate::title_card;
use crate::transcribe;
use crate::tts;

/// Silence inserted between the title narration and the body narration.
const NARRATION_GAP_S: f64 = 0.5;

/// Overlap used when looping a short music track to cover the narration.
const MUSIC_CROSSFADE_S: f64 = 5.0;

/// Caller-requested assets, matched against the catalog by file name.
/// Unset or unmatched entries fall back to random selection.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub footage: Option<String>,
    pub music: Option<String>,
}

/// Run the full assembly for one story: narration, title card, captions,
/// music bed, footage cut, final encode. Returns the finished MP4 path.
/// The per-job temp directory is removed whether assembly succeeds or not.
pub async fn assemble(
    config: &Config,
    catalog: &Catalog,
    client: &Client,
    voice: &str,
    story: &Story,
    overrides: &Overrides,
    rng: &mut StdRng,
) -> Result<PathBuf> {
    let work_dir = config.job_temp_dir(&story.id);
    fs::create_dir_all(&work_dir)
        .await
        .with_context(|| format!("Failed to create dir {}", work_dir.display()))?;

    let result = assemble_in(
        config, catalog, client, voice, story, overrides, rng, &work_dir,
    )
    .await;

    if let Err(err) = fs::remove_dir_all(&work_dir).await {
        warn!("Could not remove {}: {err}", work_dir.display());
    }
    let card = config.title_card_path(&story.id);
    let _ = fs::remove_file(&card).await;

    result
}

#[allow(clippy::too_many_arguments)]
async fn assemble_in(
    config: &Config,
    catalog: &Catalog,
    client: &Client,
    voice: &str,
    story: &Story,
    overrides: &Overrides,
    rng: &mut StdRng,
    work_dir: &Path,
) -> Result<PathBuf> {
    info!("Assembling short for '{}' [{}]", story.title, story.mood);

    // No footage means no video; bail before spending synthesis calls.
    let footage = select_footage(catalog, overrides.footage.as_deref(), rng)
        .context("No background footage available")?;

    let narration =
        tts::synthesize_story(client, voice, &story.title, &story.body, &story.id, work_dir)
            .await?;
    if narration.is_empty() {
        anyhow::bail!("Narration synthesis produced no audio for '{}'", story.title);
    }

    let title_card = title_card::render_title_card(config, story);

    let narration_path = work_dir.join("narration.mp3");
    let concatenated = ffmpeg::concat_narration(
        narration.title_audio.as_deref(),
        narration.body_audio.as_deref(),
        NARRATION_GAP_S,
        &narration_path,
    )
    .await?;
    if !concatenated {
        anyhow::bail!("Narration concat produced no file");
    }

    let narration_dur = ffmpeg::ffprobe_duration_seconds(&narration_path).await?;
    let title_dur = match &narration.title_audio {
        Some(path) => ffmpeg::ffprobe_duration_seconds(path).await.unwrap_or(0.0),
        None => 0.0,
    };

    let srt_path = work_dir.join("narration.srt");
    transcribe::word_level_srt(&narration_path, &srt_path).await;
    let subtitles = if transcribe::srt_has_entries(&srt_path).await {
        Some(srt_path.as_path())
    } else {
        None
    };

    let track = select_music(catalog, story, overrides.music.as_deref(), rng);
    let music_bed = match track {
        Some(track) => build_music_bed(track, narration_dur, work_dir).await,
        None => None,
    };
    let (audio_path, fade_audio) = match &music_bed {
        Some(bed) => {
            let mixed = work_dir.join("mixed.mp3");
            match ffmpeg::mix_audio(&narration_path, bed, narration_dur, &mixed).await {
                Ok(true) => (mixed, false),
                Ok(false) | Err(_) => {
                    warn!("Audio mix failed; using bare narration");
                    (narration_path.clone(), false)
                }
            }
        }
        None => (narration_path.clone(), true),
    };

    let footage_dur = ffmpeg::ffprobe_duration_seconds(footage).await?;
    let plan = plan_footage(footage_dur, narration_dur, rng);

    let output = config.output_path(&story.id);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }

    let spec = RenderSpec {
        footage,
        plan,
        audio: &audio_path,
        narration_dur,
        title_card: title_card.as_deref(),
        title_dur,
        subtitles,
        fade_audio,
        output: &output,
    };
    if !ffmpeg::render_short(&spec).await? {
        anyhow::bail!("Final render produced no file");
    }

    info!("Short ready: {}", output.display());
    Ok(output)
}

fn select_footage<'a>(
    catalog: &'a Catalog,
    requested: Option<&str>,
    rng: &mut StdRng,
) -> Option<&'a PathBuf> {
    if let Some(name) = requested {
        match catalog.footage_by_name(name) {
            Some(path) => return Some(path),
            None => warn!("Requested footage '{name}' not in catalog; picking randomly"),
        }
    }
    catalog.pick_footage(rng)
}

fn select_music<'a>(
    catalog: &'a Catalog,
    story: &Story,
    requested: Option<&str>,
    rng: &mut StdRng,
) -> Option<&'a MusicTrack> {
    if let Some(name) = requested {
        match catalog.music_by_name(name) {
            Some(track) => return Some(track),
            None => warn!("Requested music '{name}' not in catalog; picking by mood"),
        }
    }
    catalog.pick_music(story.mood, rng)
}

/// Produce the trimmed, volume-adjusted, faded music bed for this story,
/// looping the source track when it is shorter than the narration. Any
/// failure is logged and yields `None`; the short is then narration-only.
async fn build_music_bed(
    track: &MusicTrack,
    narration_dur: f64,
    work_dir: &Path,
) -> Option<PathBuf> {
    info!(
        "Music: {} (volume {})",
        track.path.display(),
        track.volume
    );

    let track_dur = match ffmpeg::ffprobe_duration_seconds(&track.path).await {
        Ok(dur) => dur,
        Err(err) => {
            warn!("Could not probe music track: {err:#}");
            return None;
        }
    };

    let source = if track_dur < narration_dur {
        let loops = (narration_dur / track_dur).floor() as usize + 1;
        let looped = work_dir.join("music_looped.mp3");
        match ffmpeg::loop_music_crossfade(&track.path, loops, MUSIC_CROSSFADE_S, &looped).await {
            Ok(true) => looped,
            Ok(false) | Err(_) => {
                warn!("Music loop failed; skipping music bed");
                return None;
            }
        }
    } else {
        track.path.clone()
    };

    let bed = work_dir.join("music_bed.mp3");
    match ffmpeg::prepare_music(
        &source,
        narration_dur,
        track.volume,
        MUSIC_CROSSFADE_S,
        &bed,
    )
    .await
    {
        Ok(true) => Some(bed),
        Ok(false) | Err(_) => {
            warn!("Music trim failed; skipping music bed");
            None
        }
    }
}

fn plan_footage(footage_dur: f64, narration_dur: f64, rng: &mut StdRng) -> FootagePlan {
    if footage_dur < narration_dur {
        FootagePlan::Loop {
            start: rng.gen_range(0.0..footage_dur),
        }
    } else {
        FootagePlan::Slice {
            start: rng.gen_range(0.0..=(footage_dur - narration_dur)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[tokio::test]
    async fn empty_footage_catalog_aborts_before_any_synthesis() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            temp_dir: dir.path().join("temp"),
            output_dir: dir.path().join("out"),
            ..Config::default()
        };
        let catalog = Catalog::default();
        let client = Client::new();
        let story = Story::new("Test".into(), "Hello world.".into());
        let mut rng = StdRng::seed_from_u64(1);

        // Fails fast on the missing footage; no network or ffmpeg involved.
        let err = assemble(
            &config,
            &catalog,
            &client,
            "en_us_002",
            &story,
            &Overrides::default(),
            &mut rng,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("No background footage"));
        assert!(!config.job_temp_dir(&story.id).exists());
    }

    #[test]
    fn short_footage_loops_from_a_point_inside_it() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            match plan_footage(20.0, 60.0, &mut rng) {
                FootagePlan::Loop { start } => {
                    assert!((0.0..20.0).contains(&start));
                }
                FootagePlan::Slice { .. } => panic!("short footage must loop"),
            }
        }
    }

    #[test]
    fn long_footage_slices_without_running_off_the_end() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            match plan_footage(300.0, 45.0, &mut rng) {
                FootagePlan::Slice { start } => {
                    assert!(start >= 0.0);
                    assert!(start + 45.0 <= 300.0);
                }
                FootagePlan::Loop { .. } => panic!("long footage must slice"),
            }
        }
    }

    // Footage exactly as long as the narration is one full slice from 0,
    // no looping.
    #[test]
    fn equal_durations_slice_the_whole_clip() {
        let mut rng = StdRng::seed_from_u64(2);
        match plan_footage(60.0, 60.0, &mut rng) {
            FootagePlan::Slice { start } => assert_eq!(start, 0.0),
            FootagePlan::Loop { .. } => panic!("equal durations must slice, not loop"),
        }
    }
}
