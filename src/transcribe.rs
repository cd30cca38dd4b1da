use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tracing::{info, warn};

/// Transcribe the combined narration into a word-level SRT: one caption per
/// word. Captions are best-effort; on any failure an empty SRT is written
/// so downstream can skip the subtitles filter instead of aborting.
pub async fn word_level_srt(audio: &Path, srt_out: &Path) {
    match run_whisper(audio, srt_out).await {
        Ok(()) => info!("Subtitles generated: {}", srt_out.display()),
        Err(err) => {
            warn!("Transcription failed, captions disabled: {err:#}");
            let _ = fs::write(srt_out, b"").await;
        }
    }
}

async fn run_whisper(audio: &Path, srt_out: &Path) -> Result<()> {
    let out_dir = srt_out
        .parent()
        .context("subtitle path has no parent directory")?;

    let status = Command::new("whisper")
        .arg(audio)
        .args([
            "--model",
            "tiny.en",
            "--device",
            "cpu",
            "--language",
            "en",
            "--task",
            "transcribe",
            "--word_timestamps",
            "True",
            "--max_line_count",
            "1",
            "--max_words_per_line",
            "1",
            "--fp16",
            "False",
            "--output_format",
            "srt",
            "--verbose",
            "False",
            "--output_dir",
        ])
        .arg(out_dir)
        .status()
        .await
        .context("whisper execution failed")?;

    if !status.success() {
        anyhow::bail!("whisper exited with {status}");
    }

    // whisper names its output after the audio file's stem
    let stem = audio
        .file_stem()
        .and_then(OsStr::to_str)
        .context("audio path has no stem")?;
    let produced = out_dir.join(format!("{stem}.srt"));
    if produced != srt_out {
        fs::rename(&produced, srt_out)
            .await
            .with_context(|| format!("expected transcript at {}", produced.display()))?;
    }

    if !srt_out.exists() {
        anyhow::bail!("whisper produced no transcript");
    }
    Ok(())
}

/// Whether the subtitle file has any content worth burning in.
pub async fn srt_has_entries(path: &Path) -> bool {
    match fs::read_to_string(path).await {
        Ok(content) => !content.trim().is_empty(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_srt_has_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subtitles.srt");
        fs::write(&path, b"").await.unwrap();
        assert!(!srt_has_entries(&path).await);

        fs::write(&path, b"  \n\n").await.unwrap();
        assert!(!srt_has_entries(&path).await);
    }

    #[tokio::test]
    async fn populated_srt_has_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subtitles.srt");
        fs::write(&path, b"1\n00:00:00,000 --> 00:00:00,400\nHello\n\n")
            .await
            .unwrap();
        assert!(srt_has_entries(&path).await);
    }

    #[tokio::test]
    async fn missing_srt_has_no_entries() {
        assert!(!srt_has_entries(Path::new("missing/subtitles.srt")).await);
    }
}
