use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Fade applied to the picture (and to bare narration audio) at the end.
pub const VIDEO_FADE_S: f64 = 3.0;

const SUBTITLE_STYLE: &str = "MarginV=60,Bold=-1,Fontname=Montserrat ExtraBold,Fontsize=36,\
OutlineColour=&HFF000000,BorderStyle=1,Outline=2,Shadow=2,ShadowColour=&HAA000000";

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    debug!("exec: {}", args.join(" "));
    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let status = cmd.status().await.context("Command execution failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Command failed: {:?}", args));
    }

    Ok(())
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe execution failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed for {}", path.display()));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.0 {
        return Err(anyhow::anyhow!("Invalid duration for {}", path.display()));
    }
    Ok(duration)
}

/// Concatenate the narration segments, inserting `gap_s` of silence
/// between title and body when both exist.
pub async fn concat_narration(
    title: Option<&Path>,
    body: Option<&Path>,
    gap_s: f64,
    out: &Path,
) -> Result<bool> {
    let args = match (title, body) {
        (Some(title), Some(body)) => vec![
            "ffmpeg".to_string(),
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            title.display().to_string(),
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!("aevalsrc=0:d={gap_s:.3}"),
            "-i".to_string(),
            body.display().to_string(),
            "-filter_complex".to_string(),
            "[0:a][1:a][2:a]concat=n=3:v=0:a=1[a]".to_string(),
            "-map".to_string(),
            "[a]".to_string(),
            out.display().to_string(),
        ],
        (Some(single), None) | (None, Some(single)) => vec![
            "ffmpeg".to_string(),
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            single.display().to_string(),
            out.display().to_string(),
        ],
        (None, None) => return Ok(false),
    };

    run_cmd(&args).await?;
    Ok(out.exists())
}

/// Extend a short music track by overlapping `loops` repeats with a
/// triangular cross-fade transition.
pub async fn loop_music_crossfade(
    track: &Path,
    loops: usize,
    crossfade_s: f64,
    out: &Path,
) -> Result<bool> {
    let mut args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    if loops < 2 {
        args.push("-i".to_string());
        args.push(track.display().to_string());
        args.push("-c".to_string());
        args.push("copy".to_string());
        args.push(out.display().to_string());
        run_cmd(&args).await?;
        return Ok(out.exists());
    }

    for _ in 0..loops {
        args.push("-i".to_string());
        args.push(track.display().to_string());
    }

    // acrossfade takes two inputs, so chain it across the repeats.
    let mut filter = String::new();
    let mut prev = "[0:a]".to_string();
    for i in 1..loops {
        let label = if i + 1 == loops {
            "[a]".to_string()
        } else {
            format!("[x{i}]")
        };
        filter.push_str(&format!(
            "{prev}[{i}:a]acrossfade=d={crossfade_s:.3}:c1=tri:c2=tri{label};"
        ));
        prev = label;
    }
    filter.pop();

    args.push("-filter_complex".to_string());
    args.push(filter);
    args.push("-map".to_string());
    args.push("[a]".to_string());
    args.push(out.display().to_string());

    run_cmd(&args).await?;
    Ok(out.exists())
}

/// Trim the music bed to the narration length, apply the mood volume and
/// a fade-out ending exactly at the narration's end.
pub async fn prepare_music(
    src: &Path,
    narration_dur: f64,
    volume: f64,
    fade_s: f64,
    out: &Path,
) -> Result<bool> {
    let fade_start = (narration_dur - fade_s).max(0.0);
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        src.display().to_string(),
        "-af".to_string(),
        format!(
            "atrim=start=0:end={narration_dur:.3},volume={volume},afade=t=out:st={fade_start:.3}:d={fade_s:.3}"
        ),
        out.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out.exists())
}

/// Mix narration with the processed music bed; total length follows the
/// narration (first input).
pub async fn mix_audio(
    narration: &Path,
    music: &Path,
    narration_dur: f64,
    out: &Path,
) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        narration.display().to_string(),
        "-i".to_string(),
        music.display().to_string(),
        "-filter_complex".to_string(),
        format!("[0:a][1:a]amix=inputs=2:duration=first:dropout_transition={narration_dur:.3}[a]"),
        "-map".to_string(),
        "[a]".to_string(),
        out.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out.exists())
}

/// How the footage input is cut to the narration length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FootagePlan {
    /// Footage shorter than narration: loop indefinitely from `start`.
    Loop { start: f64 },
    /// Footage covers narration: one contiguous slice from `start`.
    Slice { start: f64 },
}

pub struct RenderSpec<'a> {
    pub footage: &'a Path,
    pub plan: FootagePlan,
    pub audio: &'a Path,
    pub narration_dur: f64,
    pub title_card: Option<&'a Path>,
    pub title_dur: f64,
    pub subtitles: Option<&'a Path>,
    /// Fade the audio track out alongside the picture. Only wanted when no
    /// music bed exists; the bed already carries its own fade.
    pub fade_audio: bool,
    pub output: &'a Path,
}

pub fn build_render_args(spec: &RenderSpec<'_>) -> Vec<String> {
    let mut args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    match spec.plan {
        FootagePlan::Loop { start } => {
            args.push("-stream_loop".to_string());
            args.push("-1".to_string());
            args.push("-ss".to_string());
            args.push(format!("{start:.4}"));
        }
        FootagePlan::Slice { start } => {
            args.push("-ss".to_string());
            args.push(format!("{start:.4}"));
        }
    }
    args.push("-t".to_string());
    args.push(format!("{:.4}", spec.narration_dur));
    args.push("-i".to_string());
    args.push(spec.footage.display().to_string());

    args.push("-i".to_string());
    args.push(spec.audio.display().to_string());

    let overlay = spec.title_card.filter(|_| spec.title_dur > 0.0);
    if let Some(card) = overlay {
        args.push("-i".to_string());
        args.push(card.display().to_string());
    }

    let fade_start = (spec.narration_dur - VIDEO_FADE_S).max(0.0);
    let mut graph = format!(
        "[0:v]crop=ih*9/16:ih:(iw-ih*9/16)/2:0,scale=1080:1920,setpts=PTS-STARTPTS,\
fade=t=out:st={fade_start:.3}:d={VIDEO_FADE_S}[v0]"
    );
    let mut video_label = "[v0]".to_string();

    if overlay.is_some() {
        graph.push_str(&format!(
            ";[2:v]scale='min(1000,iw)':-1[card];{video_label}[card]overlay=(W-w)/2:(H-h)/3:\
enable='between(t,0,{:.3})'[v1]",
            spec.title_dur
        ));
        video_label = "[v1]".to_string();
    }

    if let Some(srt) = spec.subtitles {
        graph.push_str(&format!(
            ";{video_label}subtitles={}:force_style='{SUBTITLE_STYLE}'[v2]",
            srt.display()
        ));
        video_label = "[v2]".to_string();
    }

    let audio_label = if spec.fade_audio {
        graph.push_str(&format!(
            ";[1:a]afade=t=out:st={fade_start:.3}:d={VIDEO_FADE_S}[a]"
        ));
        "[a]".to_string()
    } else {
        "1:a".to_string()
    };

    args.push("-filter_complex".to_string());
    args.push(graph);
    args.push("-map".to_string());
    args.push(video_label);
    args.push("-map".to_string());
    args.push(audio_label);

    for opt in [
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-preset",
        "medium",
        "-crf",
        "23",
        "-c:a",
        "aac",
        "-b:a",
        "192k",
        "-movflags",
        "+faststart",
    ] {
        args.push(opt.to_string());
    }
    args.push(spec.output.display().to_string());

    args
}

/// Final encode: footage + mixed audio + overlays into one MP4.
pub async fn render_short(spec: &RenderSpec<'_>) -> Result<bool> {
    let args = build_render_args(spec);
    run_cmd(&args).await?;
    Ok(spec.output.exists())
}
