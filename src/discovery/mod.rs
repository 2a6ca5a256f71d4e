//! Discovery scoring: a fixed rubric over a caption and its hashtags/keywords.
//!
//! Every check is a pure function returning its points and, when points were
//! lost, a tip. The total is clamped to `0..=100` and graded.

pub mod amplify;
pub mod hashtags;
pub mod seo;

use serde::Serialize;

pub use amplify::{AmplifyReport, ReachAmplify};

pub const MAX_SCORE: u32 = 100;

/// Phrases that count as a call to action.
pub const CTA_PHRASES: [&str; 10] = [
    "help is",
    "reach out",
    "you are not alone",
    "call",
    "here for you",
    "visit",
    "contact",
    "donate",
    "learn more",
    "link in bio",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn for_score(score: u32) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub points: u32,
    pub max: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

impl CheckResult {
    fn new(name: &'static str, points: u32, max: u32, tip: Option<&str>) -> Self {
        Self {
            name,
            points: points.min(max),
            max,
            tip: tip.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryScore {
    pub total: u32,
    pub max: u32,
    pub grade: Grade,
    pub breakdown: Vec<CheckResult>,
    pub tips: Vec<String>,
}

/// Everything the rubric looks at.
#[derive(Debug, Clone, Default)]
pub struct ScoreInput<'a> {
    pub caption: &'a str,
    pub hashtags: &'a [String],
    pub keywords: &'a [String],
    pub local_terms: &'a [String],
}

pub fn score(input: &ScoreInput<'_>) -> DiscoveryScore {
    let hashtag_count = hashtags::merged(input.hashtags, input.caption).len();
    let breakdown = vec![
        length_check(input.caption),
        hashtag_check(hashtag_count),
        keyword_check(input.caption, input.keywords),
        emoji_check(input.caption),
        cta_check(input.caption),
        local_check(input.caption, input.hashtags, input.local_terms),
    ];
    let total = breakdown
        .iter()
        .map(|check| check.points)
        .sum::<u32>()
        .min(MAX_SCORE);
    let tips = breakdown
        .iter()
        .filter_map(|check| check.tip.clone())
        .collect();
    DiscoveryScore {
        total,
        max: MAX_SCORE,
        grade: Grade::for_score(total),
        breakdown,
        tips,
    }
}

pub fn length_check(caption: &str) -> CheckResult {
    let len = caption.trim().chars().count();
    match len {
        0 => CheckResult::new("length", 0, 20, Some("Write a caption: empty posts are rarely surfaced")),
        1..=99 => CheckResult::new(
            "length",
            5,
            20,
            Some("Aim for 100-300 characters so the caption has room for searchable terms"),
        ),
        100..=300 => CheckResult::new("length", 20, 20, None),
        _ => CheckResult::new(
            "length",
            15,
            20,
            Some("Front-load the message: long captions are truncated after the first lines"),
        ),
    }
}

pub fn hashtag_check(count: usize) -> CheckResult {
    match count {
        0 => CheckResult::new("hashtags", 0, 20, Some("Add 5-30 relevant hashtags")),
        1..=4 => CheckResult::new("hashtags", 5, 20, Some("Use at least 5 hashtags to widen reach")),
        5..=30 => CheckResult::new("hashtags", 20, 20, None),
        _ => CheckResult::new("hashtags", 5, 20, Some("Instagram allows at most 30 hashtags")),
    }
}

pub fn keyword_check(caption: &str, keywords: &[String]) -> CheckResult {
    let lower = caption.to_lowercase();
    let found = keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty() && lower.contains(keyword.as_str()))
        .count() as u32;
    let points = (found * 5).min(20);
    let tip = (points < 20).then_some("Work more searchable keywords into the caption naturally");
    CheckResult::new("keywords", points, 20, tip)
}

pub fn emoji_count(text: &str) -> usize {
    text.chars().filter(|c| is_emoji(*c)).count()
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0x2190..=0x21FF | 0x2300..=0x23FF
    )
}

pub fn emoji_check(caption: &str) -> CheckResult {
    match emoji_count(caption) {
        0 => CheckResult::new("emoji", 0, 10, Some("A supportive emoji such as 💜 lifts engagement")),
        1..=5 => CheckResult::new("emoji", 10, 10, None),
        _ => CheckResult::new("emoji", 5, 10, Some("Trim emojis: more than five reads as noisy")),
    }
}

pub fn has_cta(caption: &str) -> bool {
    let lower = caption.to_lowercase();
    CTA_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

pub fn cta_check(caption: &str) -> CheckResult {
    if has_cta(caption) {
        CheckResult::new("call_to_action", 20, 20, None)
    } else {
        CheckResult::new(
            "call_to_action",
            0,
            20,
            Some("End with a call to action such as 'reach out' or 'help is available'"),
        )
    }
}

pub fn local_check(caption: &str, hashtags: &[String], local_terms: &[String]) -> CheckResult {
    let mut haystack = caption.to_lowercase();
    for tag in hashtags {
        haystack.push(' ');
        haystack.push_str(&tag.to_lowercase());
    }
    let squashed = haystack.replace(' ', "");
    let local = local_terms.iter().any(|term| {
        let term = term.trim().to_lowercase();
        !term.is_empty()
            && (haystack.contains(term.as_str()) || squashed.contains(&term.replace(' ', "")))
    });
    if local {
        CheckResult::new("local_relevance", 10, 10, None)
    } else {
        CheckResult::new(
            "local_relevance",
            0,
            10,
            Some("Mention the community you serve to reach local searchers"),
        )
    }
}
