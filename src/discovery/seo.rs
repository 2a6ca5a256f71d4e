use std::collections::BTreeMap;

use serde::Serialize;

const CTA_WORDS: [&str; 7] = [
    "help",
    "reach out",
    "call",
    "contact",
    "visit",
    "learn",
    "support",
];

const EMOTIONAL_WORDS: [&str; 8] = [
    "hope", "strength", "healing", "love", "care", "safe", "support", "courage",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeywordDensity {
    pub count: usize,
    /// Occurrences per hundred words, two decimals.
    pub density: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoAnalysis {
    pub keyword_density: BTreeMap<String, KeywordDensity>,
    pub seo_score: u32,
    pub recommendations: Vec<String>,
}

pub fn analyze(caption: &str, keywords: &[String]) -> SeoAnalysis {
    let lower = caption.to_lowercase();
    let word_count = caption.split_whitespace().count();
    let char_count = caption.chars().count();

    let mut keyword_density = BTreeMap::new();
    for keyword in keywords {
        let needle = keyword.trim().to_lowercase();
        let count = if needle.is_empty() {
            0
        } else {
            lower.matches(needle.as_str()).count()
        };
        let density = if word_count > 0 {
            round2(count as f64 / word_count as f64 * 100.0)
        } else {
            0.0
        };
        keyword_density.insert(keyword.clone(), KeywordDensity { count, density });
    }

    let mut score = 0u32;
    if (100..=300).contains(&char_count) {
        score += 20;
    } else if char_count > 300 {
        score += 15;
    }

    let keywords_found = keyword_density.values().filter(|d| d.count > 0).count() as u32;
    score += (keywords_found * 10).min(30);

    let has_cta = CTA_WORDS.iter().any(|word| lower.contains(word));
    if has_cta {
        score += 20;
    }

    let emotional = EMOTIONAL_WORDS
        .iter()
        .filter(|word| lower.contains(*word))
        .count() as u32;
    score += (emotional * 5).min(20);

    if caption.chars().any(|c| !c.is_ascii()) {
        score += 10;
    }

    let mut recommendations = Vec::new();
    if char_count < 100 {
        recommendations.push("Consider a longer caption for better SEO".to_string());
    }
    if keywords_found < 2 {
        recommendations.push("Include more searchable keywords naturally".to_string());
    }
    if !has_cta {
        recommendations.push("Add a clear call-to-action".to_string());
    }

    SeoAnalysis {
        keyword_density,
        seo_score: score.min(100),
        recommendations,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct PostingSlot {
    pub time: &'static str,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostingTimes {
    pub best_days: Vec<&'static str>,
    pub best_times: Vec<PostingSlot>,
    pub avoid: Vec<&'static str>,
    pub special_notes: Vec<&'static str>,
}

pub fn best_posting_times() -> PostingTimes {
    PostingTimes {
        best_days: vec!["Tuesday", "Wednesday", "Thursday"],
        best_times: vec![
            PostingSlot {
                time: "11:00 AM",
                reason: "Lunch break browsing",
            },
            PostingSlot {
                time: "2:00 PM",
                reason: "Afternoon engagement peak",
            },
            PostingSlot {
                time: "7:00 PM",
                reason: "Evening wind-down, people seeking support",
            },
            PostingSlot {
                time: "9:00 PM",
                reason: "Late night, when people often reflect or seek help",
            },
        ],
        avoid: vec![
            "Very early morning (before 7 AM)",
            "Late Friday/Saturday nights",
        ],
        special_notes: vec![
            "Awareness month posts perform best mid-week",
            "Crisis resource posts get more saves in evening hours",
            "Weekend posts have lower reach but higher engagement from those who see them",
        ],
    }
}
