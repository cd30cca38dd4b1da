use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

const TTS_ENDPOINT: &str = "https://tiktok-tts.weilnet.workers.dev/api/generation";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The synthesis API rejects long payloads; content is split at sentence
/// boundaries and the returned audio chunks are concatenated.
const MAX_CHUNK_CHARS: usize = 300;

/// Paths of the synthesized narration segments. Either may be absent after
/// a failed or skipped synthesis; assembly needs at least one.
#[derive(Debug, Clone, Default)]
pub struct Narration {
    pub title_audio: Option<PathBuf>,
    pub body_audio: Option<PathBuf>,
}

impl Narration {
    pub fn is_empty(&self) -> bool {
        self.title_audio.is_none() && self.body_audio.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    data: Option<String>,
    error: Option<String>,
}

/// Synthesize narration for a story's title and body into `out_dir`.
/// Per-segment failures are logged and leave that segment unset.
pub async fn synthesize_story(
    client: &Client,
    voice: &str,
    title: &str,
    body: &str,
    story_id: &str,
    out_dir: &Path,
) -> Result<Narration> {
    let mut narration = Narration::default();
    if title.trim().is_empty() && body.trim().is_empty() {
        warn!("Both title and body are empty; nothing to synthesize");
        return Ok(narration);
    }

    fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create dir {}", out_dir.display()))?;

    if !title.trim().is_empty() {
        let out = out_dir.join(format!("title_{story_id}.mp3"));
        match synthesize_text(client, voice, title).await {
            Ok(bytes) => {
                fs::write(&out, &bytes).await?;
                info!("Title narration written: {}", out.display());
                narration.title_audio = Some(out);
            }
            Err(err) => warn!("Title synthesis failed: {err:#}"),
        }
    }

    if !body.trim().is_empty() {
        let out = out_dir.join(format!("content_{story_id}.mp3"));
        match synthesize_text(client, voice, body).await {
            Ok(bytes) => {
                fs::write(&out, &bytes).await?;
                info!("Body narration written: {}", out.display());
                narration.body_audio = Some(out);
            }
            Err(err) => warn!("Body synthesis failed: {err:#}"),
        }
    }

    Ok(narration)
}

async fn synthesize_text(client: &Client, voice: &str, text: &str) -> Result<Vec<u8>> {
    let mut audio = Vec::new();

    for chunk in split_chunks(text, MAX_CHUNK_CHARS) {
        let body = serde_json::json!({
            "text": chunk,
            "voice": voice,
        });

        let resp = client
            .post(TTS_ENDPOINT)
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("TTS request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("TTS service returned HTTP {}", resp.status().as_u16());
        }

        let parsed: TtsResponse = resp.json().await.context("TTS response parse failed")?;
        let data = parsed.data.ok_or_else(|| {
            anyhow::anyhow!(
                "TTS service error: {}",
                parsed.error.unwrap_or_else(|| "unknown".to_string())
            )
        })?;

        let bytes = BASE64
            .decode(data.as_bytes())
            .context("TTS payload was not valid base64")?;
        audio.extend_from_slice(&bytes);
    }

    if audio.is_empty() {
        anyhow::bail!("TTS produced no audio");
    }
    Ok(audio)
}

static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)([^.!?]+[.!?]+)|([^.!?]+$)").expect("sentence regex"));

/// Split text into chunks of at most `max_chars`, preferring sentence
/// boundaries, then word boundaries for oversized sentences.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    for cap in SENTENCE_RE.captures_iter(text) {
        let s = cap.get(0).map(|m| m.as_str().trim()).unwrap_or_default();
        if !s.is_empty() {
            sentences.push(s.to_string());
        }
    }
    if sentences.is_empty() {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        sentences.push(trimmed.to_string());
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in sentences {
        if sentence.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_words(&sentence, max_chars));
            continue;
        }
        if current.is_empty() {
            current = sentence;
        } else if current.chars().count() + 1 + sentence.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(&sentence);
        } else {
            chunks.push(std::mem::take(&mut current));
            current = sentence;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_words(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in sentence.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_chunks("Hello world.", 300);
        assert_eq!(chunks, vec!["Hello world.".to_string()]);
    }

    #[test]
    fn chunks_break_at_sentence_boundaries() {
        let text = "First sentence here. Second one follows! Third ends it?";
        let chunks = split_chunks(text, 25);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "First sentence here.");
        assert_eq!(chunks[1], "Second one follows!");
    }

    #[test]
    fn chunks_pack_sentences_up_to_the_limit() {
        let text = "One. Two. Three.";
        let chunks = split_chunks(text, 300);
        assert_eq!(chunks, vec!["One. Two. Three.".to_string()]);
    }

    #[test]
    fn oversized_sentence_splits_on_words() {
        let text = "word ".repeat(100);
        let chunks = split_chunks(&text, 30);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 30));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_chunks("", 300).is_empty());
        assert!(split_chunks("   ", 300).is_empty());
    }
}
