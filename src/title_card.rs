use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use std::path::PathBuf;
use tracing::warn;

use crate::catalog::Mood;
use crate::config::Config;
use crate::story::Story;

// Text box margins inside the template, in pixels.
const BOX_LEFT: u32 = 148;
const BOX_TOP: u32 = 198;
const BOX_RIGHT: u32 = 148;
const BOX_BOTTOM: u32 = 134;

const TITLE_FONT_SIZE: f32 = 60.0;
const LINE_SPACING: u32 = 10;
const TITLE_COLOR: Rgba<u8> = Rgba([35, 31, 32, 255]);

const BADGE_SIZE: u32 = 244;
const BADGE_X: i64 = 222;
const BADGE_Y: i64 = 368;

/// Render the title card for a story: template + wrapped title text +
/// mood badge, saved as `<temp>/images/<story-id>.png`. Any failure is
/// logged and yields `None`; the video is then produced without a card.
pub fn render_title_card(config: &Config, story: &Story) -> Option<PathBuf> {
    match try_render(config, story) {
        Ok(path) => Some(path),
        Err(err) => {
            warn!("Title card skipped for '{}': {err:#}", story.title);
            None
        }
    }
}

fn try_render(config: &Config, story: &Story) -> Result<PathBuf> {
    let template_path = config.template_path();
    let mut canvas: RgbaImage = image::open(&template_path)
        .with_context(|| format!("Failed to open template {}", template_path.display()))?
        .to_rgba8();

    let (width, height) = canvas.dimensions();
    let box_width = width
        .checked_sub(BOX_LEFT + BOX_RIGHT)
        .filter(|w| *w > 0)
        .context("template narrower than the title box margins")?;
    height
        .checked_sub(BOX_TOP + BOX_BOTTOM)
        .filter(|h| *h > 0)
        .context("template shorter than the title box margins")?;

    let font_bytes = std::fs::read(&config.font_file)
        .with_context(|| format!("Failed to read font {}", config.font_file.display()))?;
    let font = FontVec::try_from_vec(font_bytes)
        .map_err(|_| anyhow::anyhow!("Invalid font file {}", config.font_file.display()))?;
    let scale = PxScale::from(TITLE_FONT_SIZE);

    match load_badge(config, story.mood) {
        Some(badge) => {
            let badge = imageops::resize(&badge, BADGE_SIZE, BADGE_SIZE, FilterType::Lanczos3);
            imageops::overlay(&mut canvas, &badge, BADGE_X, BADGE_Y);
        }
        None => warn!("No badge image for mood '{}'; card has title only", story.mood),
    }

    let lines = wrap_title(&story.title, box_width as f32, |text| {
        line_width(&font, scale, text)
    });
    let line_height = TITLE_FONT_SIZE as u32 + LINE_SPACING;
    let mut y = BOX_TOP;
    for line in &lines {
        draw_text_mut(
            &mut canvas,
            TITLE_COLOR,
            BOX_LEFT as i32,
            y as i32,
            scale,
            &font,
            line,
        );
        y += line_height;
    }

    let out_path = config.title_card_path(&story.id);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    canvas
        .save(&out_path)
        .with_context(|| format!("Failed to save title card {}", out_path.display()))?;

    Ok(out_path)
}

fn load_badge(config: &Config, mood: Mood) -> Option<RgbaImage> {
    for path in [config.badge_path(mood), config.default_badge_path()] {
        if let Ok(img) = image::open(&path) {
            return Some(img.to_rgba8());
        }
    }
    None
}

fn line_width(font: &FontVec, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    text.chars().map(|c| scaled.h_advance(font.glyph_id(c))).sum()
}

/// Greedy word wrap against a pixel budget: append a word while the line
/// still fits, else break. A single word wider than the box is placed on
/// its own line and allowed to overflow.
pub fn wrap_title(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure(&candidate) <= max_width {
            current = candidate;
        } else if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(std::mem::take(&mut current));
            if measure(word) > max_width {
                lines.push(word.to_string());
            } else {
                current = word.to_string();
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    // One unit per character keeps the wrap arithmetic easy to follow.
    fn by_chars(text: &str) -> f32 {
        text.chars().count() as f32
    }

    #[test]
    fn short_title_stays_on_one_line() {
        let lines = wrap_title("Hello world", 40.0, by_chars);
        assert_eq!(lines, vec!["Hello world".to_string()]);
    }

    #[test]
    fn wraps_at_the_pixel_budget() {
        let lines = wrap_title("one two three four", 9.0, by_chars);
        assert_eq!(
            lines,
            vec!["one two".to_string(), "three".to_string(), "four".to_string()]
        );
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let lines = wrap_title("a extraordinarily b", 6.0, by_chars);
        assert_eq!(
            lines,
            vec![
                "a".to_string(),
                "extraordinarily".to_string(),
                "b".to_string()
            ]
        );
    }

    #[test]
    fn empty_title_yields_no_lines() {
        assert!(wrap_title("", 40.0, by_chars).is_empty());
        assert!(wrap_title("   ", 40.0, by_chars).is_empty());
    }

    #[test]
    fn every_line_fits_unless_single_word() {
        let text = "the quick brown fox jumps over the lazy dog again and again";
        let lines = wrap_title(text, 15.0, by_chars);
        for line in &lines {
            assert!(by_chars(line) <= 15.0 || !line.contains(' '));
        }
        // No words lost in the wrap
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text);
    }
}
