use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

pub const DEFAULT_VOICE: &str = "en_us_002";

/// Full fixed catalog of synthesis voice codes.
pub const VOICES: &[&str] = &[
    // English - US
    "en_us_001",
    "en_us_002",
    "en_us_006",
    "en_us_007",
    "en_us_009",
    "en_us_010",
    // English - UK / AU
    "en_uk_001",
    "en_uk_003",
    "en_au_001",
    "en_au_002",
    // English - characters
    "en_us_ghostface",
    "en_us_chewbacca",
    "en_us_c3po",
    "en_us_stitch",
    "en_us_stormtrooper",
    "en_us_rocket",
    "en_male_jomboy",
    "en_male_funny",
    "en_female_samc",
    "en_male_cody",
    "en_female_makeup",
    "en_female_richgirl",
    "en_male_grinch",
    "en_male_narration",
    "en_male_deadpool",
    "en_male_jarvis",
    "en_male_ashmagic",
    "en_male_olantekkers",
    "en_male_ukneighbor",
    "en_male_ukbutler",
    "en_female_shenna",
    "en_female_pansino",
    "en_male_trevor",
    "en_female_betty",
    "en_male_cupid",
    "en_female_grandma",
    "en_male_wizard",
    "en_male_santa_narration",
    "en_male_santa_effect",
    "en_male_sing_deep_jingle",
    "en_male_m2_xhxs_m03_christmas",
    "en_male_m2_xhxs_m03_silly",
    "en_female_ht_f08_newyear",
    "en_female_ht_f08_halloween",
    "en_female_ht_f08_glorious",
    "en_female_ht_f08_wonderful_world",
    "en_male_sing_funny_it_goes_up",
    "en_male_sing_funny_thanksgiving",
    "en_female_f08_twinkle",
    "en_female_f08_warmy_breeze",
    "en_female_f08_salut_damour",
    "en_male_m03_classical",
    "en_male_m03_lobby",
    "en_male_m03_sunshine_soon",
    "en_female_emotional",
    // Non-English (filtered out of the UI listing except the allow-list)
    "fr_001",
    "fr_002",
    "de_001",
    "de_002",
    "es_002",
    "es_mx_002",
    "br_001",
    "br_003",
    "br_004",
    "br_005",
    "id_001",
    "jp_001",
    "jp_003",
    "jp_005",
    "jp_006",
    "kr_002",
    "kr_003",
    "kr_004",
];

/// Curated display names; anything missing falls back to a title-cased code.
static NAME_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("en_male_jomboy", "Game On"),
        ("en_us_002", "Jessie"),
        ("es_mx_002", "Warm"),
        ("en_male_funny", "Wacky"),
        ("en_us_ghostface", "Scream"),
        ("en_female_samc", "Empathetic"),
        ("en_male_cody", "Serious"),
        ("en_female_makeup", "Beauty Guru"),
        ("en_female_richgirl", "Bestie"),
        ("en_male_grinch", "Trickster"),
        ("en_us_006", "Joey"),
        ("en_male_narration", "Story Teller"),
        ("en_male_deadpool", "Mr. GoodGuy"),
        ("en_uk_001", "Narrator"),
        ("en_uk_003", "Male English UK"),
        ("en_au_001", "Metro"),
        ("en_au_002", "Smooth"),
        ("en_male_jarvis", "Alfred"),
        ("en_male_ashmagic", "ashmagic"),
        ("en_male_olantekkers", "olantekkers"),
        ("en_male_ukneighbor", "Lord Cringe"),
        ("en_male_ukbutler", "Mr. Meticulous"),
        ("en_female_shenna", "Debutante"),
        ("en_female_pansino", "Varsity"),
        ("en_male_trevor", "Marty"),
        ("en_female_f08_twinkle", "Pop Lullaby"),
        ("en_male_m03_classical", "Classic Electric"),
        ("en_female_betty", "Bae"),
        ("en_male_cupid", "Cupid"),
        ("en_female_grandma", "Granny"),
        ("en_male_m2_xhxs_m03_christmas", "Cozy"),
        ("en_male_santa_narration", "Author"),
        ("en_male_sing_deep_jingle", "Caroler"),
        ("en_male_santa_effect", "Santa"),
        ("en_female_ht_f08_newyear", "NYE 2023"),
        ("en_male_wizard", "Magician"),
        ("en_female_ht_f08_halloween", "Opera"),
        ("en_female_ht_f08_glorious", "Euphoric"),
        ("en_male_sing_funny_it_goes_up", "Hypetrain"),
        ("en_female_ht_f08_wonderful_world", "Melodrama"),
        ("en_male_m2_xhxs_m03_silly", "Quirky Time"),
        ("en_female_emotional", "Peaceful"),
        ("en_male_m03_sunshine_soon", "Toon Beat"),
        ("en_female_f08_warmy_breeze", "Open Mic"),
        ("en_male_sing_funny_thanksgiving", "Thanksgiving"),
        ("en_female_f08_salut_damour", "Cottagecore"),
        ("en_us_007", "Professor"),
        ("en_us_009", "Scientist"),
        ("en_us_010", "Confidence"),
        ("fr_001", "French - Male 1"),
    ])
});

/// Voices surfaced first in the UI, in this order.
const PRIORITIZED: &[&str] = &[
    "en_male_jomboy",
    "en_us_002",
    "es_mx_002",
    "en_male_funny",
    "en_us_ghostface",
    "en_female_samc",
    "en_male_cody",
    "en_female_makeup",
    "en_female_richgirl",
    "en_male_grinch",
    "en_us_006",
    "en_male_narration",
    "en_male_deadpool",
];

/// Non-English codes that still make the listing.
const EXTRA_ALLOWED: &[&str] = &["fr_001", "es_mx_002"];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub category: String,
}

pub fn is_known(code: &str) -> bool {
    VOICES.contains(&code)
}

/// Resolve a requested voice code, falling back to the default on
/// unknown or missing input.
pub fn resolve(requested: Option<&str>) -> &'static str {
    let Some(code) = requested.filter(|c| !c.is_empty()) else {
        return DEFAULT_VOICE;
    };
    match VOICES.iter().find(|&&v| v == code) {
        Some(&v) => v,
        None => {
            warn!("Unknown voice '{}'; falling back to {}", code, DEFAULT_VOICE);
            DEFAULT_VOICE
        }
    }
}

pub fn display_name(code: &str) -> String {
    if let Some(name) = NAME_MAP.get(code) {
        return name.to_string();
    }
    code.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn listed_language(code: &str) -> bool {
    code.starts_with("en_") || EXTRA_ALLOWED.contains(&code)
}

/// Catalog for the web UI: prioritized voices first, then the rest of the
/// fixed catalog, all filtered to the language allow-list.
pub fn listed() -> Vec<VoiceInfo> {
    let mut out = Vec::new();

    for code in PRIORITIZED {
        if is_known(code) && listed_language(code) {
            out.push(VoiceInfo {
                id: code.to_string(),
                name: display_name(code),
                category: "TikTok".to_string(),
            });
        }
    }

    for code in VOICES {
        if PRIORITIZED.contains(code) || !listed_language(code) {
            continue;
        }
        out.push(VoiceInfo {
            id: code.to_string(),
            name: display_name(code),
            category: "TikTok".to_string(),
        });
    }

    out
}
