use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use crate::catalog::Mood;

/// One parsed story record. `subreddit` and `url` are placeholder fields
/// kept for the output metadata; local stories have no real origin.
#[derive(Debug, Clone)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub body: String,
    pub mood: Mood,
    pub subreddit: String,
    pub url: String,
}

impl Story {
    pub fn new(title: String, body: String) -> Self {
        let id = Uuid::new_v4().to_string();
        let mood = Mood::classify(&format!("{title}\n{body}"));
        let url = format!("local_story_url_{id}");
        Self {
            id,
            title,
            body,
            mood,
            subreddit: "local_story".to_string(),
            url,
        }
    }
}

/// Parse the flat story-file format: repeated blocks of `Title: <text>`,
/// then a `Story:` line, then body lines until the next `Title:` or EOF.
/// Records missing a trimmed title or body are dropped.
pub fn parse_stories(text: &str) -> Vec<Story> {
    let mut out = Vec::new();
    let mut title: Option<String> = None;
    let mut body_lines: Vec<String> = Vec::new();
    let mut collecting = false;

    for raw in text.lines() {
        let line = raw.trim();
        if let Some(rest) = line.strip_prefix("Title:") {
            push_record(&mut out, title.take(), &body_lines);
            body_lines.clear();
            collecting = false;
            title = Some(rest.trim().to_string());
        } else if collecting {
            // Everything up to the next Title: belongs to the body, even a
            // literal "Story:" line.
            body_lines.push(line.to_string());
        } else if line == "Story:" && title.is_some() {
            collecting = true;
        }
    }
    push_record(&mut out, title.take(), &body_lines);

    out
}

fn push_record(out: &mut Vec<Story>, title: Option<String>, body_lines: &[String]) {
    let Some(title) = title else { return };
    let title = title.trim().to_string();
    let body = body_lines.join("\n").trim().to_string();
    if title.is_empty() || body.is_empty() {
        return;
    }
    out.push(Story::new(title, body));
}

/// Case-insensitive substring check against the configured word list.
pub fn contains_profanity(text: &str, words: &[String]) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    words.iter().any(|w| lower.contains(&w.to_lowercase()))
}

/// Per-run record of which story ids have already been served. Restarting
/// the process resets eligibility; there is no persistence by design.
#[derive(Debug, Default)]
pub struct StorySession {
    served: HashSet<String>,
}

impl StorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniformly choose an unserved story. With `profanity` set, matching
    /// records are marked served and skipped. `None` once every record is
    /// exhausted or rejected.
    pub fn pick<'a>(
        &mut self,
        stories: &'a [Story],
        profanity: Option<&[String]>,
        rng: &mut StdRng,
    ) -> Option<&'a Story> {
        loop {
            let available: Vec<&Story> = stories
                .iter()
                .filter(|s| !self.served.contains(&s.id))
                .collect();
            if available.is_empty() {
                return None;
            }

            let chosen = available[rng.gen_range(0..available.len())];
            self.served.insert(chosen.id.clone());

            if let Some(words) = profanity {
                if contains_profanity(&chosen.title, words)
                    || contains_profanity(&chosen.body, words)
                {
                    info!("Story '{}' contains filtered words; skipping", chosen.title);
                    continue;
                }
            }

            return Some(chosen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn parses_single_block() {
        let stories = parse_stories("Title: Test\nStory:\nHello world.\n");
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].title, "Test");
        assert_eq!(stories[0].body, "Hello world.");
        assert_eq!(stories[0].mood, Mood::General);
        assert!(!stories[0].id.is_empty());
    }

    #[test]
    fn parses_multiple_blocks_with_multiline_bodies() {
        let text = "Title: First\nStory:\nline one\nline two\nTitle: Second\nStory:\nonly line\n";
        let stories = parse_stories(text);
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].body, "line one\nline two");
        assert_eq!(stories[1].title, "Second");
        assert_eq!(stories[1].body, "only line");
    }

    #[test]
    fn ids_are_unique_within_a_parse() {
        let text = "Title: A\nStory:\nx\nTitle: B\nStory:\ny\nTitle: C\nStory:\nz\n";
        let stories = parse_stories(text);
        let ids: HashSet<&str> = stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn story_marker_inside_a_body_is_kept_as_text() {
        let text = "Title: Meta\nStory:\nHe said\nStory:\nis my favorite word\n";
        let stories = parse_stories(text);
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].body, "He said\nStory:\nis my favorite word");
    }

    #[test]
    fn drops_records_missing_title_or_body() {
        let text = "Title: No body here\nTitle: Good\nStory:\nbody\nTitle:\nStory:\norphan body\n";
        let stories = parse_stories(text);
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].title, "Good");
    }

    #[test]
    fn mood_comes_from_title_or_body() {
        let creepy = parse_stories("Title: A creepy walk\nStory:\nIn the woods.\n");
        assert_eq!(creepy[0].mood, Mood::Creepy);

        let storytime = parse_stories("Title: Evening\nStory:\nA story about my day.\n");
        assert_eq!(storytime[0].mood, Mood::Storytime);
    }

    #[test]
    fn profanity_check_is_case_insensitive_substring() {
        let list = words(&["fuck"]);
        assert!(contains_profanity("what the FUCKing deal", &list));
        assert!(!contains_profanity("perfectly fine", &list));
        assert!(!contains_profanity("", &list));
    }

    #[test]
    fn filtered_stories_are_never_selected() {
        let stories = vec![
            Story::new("Clean".into(), "nothing wrong".into()),
            Story::new("Dirty".into(), "this is fucking bad".into()),
        ];
        let list = words(&["fucking"]);

        // Whatever the seed picks first, the dirty story must never come back.
        for seed in 0..20 {
            let mut session = StorySession::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = session.pick(&stories, Some(&list), &mut rng).unwrap();
            assert_eq!(picked.title, "Clean");
        }
    }

    #[test]
    fn session_exhausts_without_repeats() {
        let stories = vec![
            Story::new("A".into(), "x".into()),
            Story::new("B".into(), "y".into()),
        ];
        let mut session = StorySession::new();
        let mut rng = StdRng::seed_from_u64(3);

        let first = session.pick(&stories, None, &mut rng).unwrap().id.clone();
        let second = session.pick(&stories, None, &mut rng).unwrap().id.clone();
        assert_ne!(first, second);
        assert!(session.pick(&stories, None, &mut rng).is_none());
    }

    #[test]
    fn all_rejected_returns_none() {
        let stories = vec![Story::new("Bad".into(), "porn everywhere".into())];
        let list = words(&["porn"]);
        let mut session = StorySession::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(session.pick(&stories, Some(&list), &mut rng).is_none());
    }
}
