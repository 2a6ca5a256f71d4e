use serde::Serialize;

use crate::discovery::hashtags;
use crate::error::{ReachPosterError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct PlatformProfile {
    pub name: &'static str,
    pub icon: &'static str,
    pub hashtag_count: usize,
    /// Recommended caption length, shorter than the hard limit used by adaptation.
    pub caption_length: usize,
    pub char_limit: usize,
    pub tone: &'static str,
    pub tips: [&'static str; 4],
}

pub const PLATFORMS: [(&str, PlatformProfile); 3] = [
    (
        "facebook",
        PlatformProfile {
            name: "Facebook",
            icon: "📘",
            hashtag_count: 3,
            caption_length: 250,
            char_limit: 500,
            tone: "conversational",
            tips: [
                "Keep captions conversational - Facebook is more personal",
                "Use 1-3 hashtags max (unlike Instagram's 20-30)",
                "Tag your location for local reach",
                "Consider boosting posts for wider reach",
            ],
        },
    ),
    (
        "linkedin",
        PlatformProfile {
            name: "LinkedIn",
            icon: "💼",
            hashtag_count: 5,
            caption_length: 700,
            char_limit: 1300,
            tone: "professional",
            tips: [
                "Focus on organizational impact and professional tone",
                "Share statistics and research findings",
                "Highlight corporate partnerships and giving programs",
                "Tag partner organizations",
            ],
        },
    ),
    (
        "tiktok",
        PlatformProfile {
            name: "TikTok",
            icon: "🎵",
            hashtag_count: 5,
            caption_length: 80,
            char_limit: 150,
            tone: "casual",
            tips: [
                "Keep captions SHORT and punchy (under 80 chars)",
                "Use trending sounds and music",
                "Hook viewers in first 3 seconds",
                "Be authentic - TikTok rewards real over polished",
            ],
        },
    ),
];

/// Room kept free for the re-appended hashtags.
const HASHTAG_RESERVE: usize = 50;
const ELLIPSIS: &str = "...";

pub fn platform(key: &str) -> Option<(&'static str, &'static PlatformProfile)> {
    let key = key.trim().to_lowercase();
    PLATFORMS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(name, profile)| (*name, profile))
}

#[derive(Debug, Clone, Serialize)]
pub struct AdaptedCaption {
    pub platform: &'static str,
    pub adapted_caption: String,
    pub hashtags: Vec<String>,
    pub char_count: usize,
    pub char_limit: usize,
    pub within_limit: bool,
    pub tips: Vec<&'static str>,
}

/// Strips hashtags, truncates the body to fit the platform limit, then
/// re-appends the first few hashtags.
pub fn adapt_for_platform(caption: &str, platform_key: &str) -> Result<AdaptedCaption> {
    let caption = caption.trim();
    if caption.is_empty() {
        return Err(ReachPosterError::Validation("Caption is required".to_string()));
    }
    let (name, profile) = platform(platform_key).ok_or_else(|| {
        ReachPosterError::Validation(
            "Invalid platform. Use: facebook, linkedin, tiktok".to_string(),
        )
    })?;

    let tags: Vec<String> = hashtags::extract(caption)
        .into_iter()
        .take(profile.hashtag_count)
        .collect();
    let mut body = hashtags::strip(caption);
    let budget = profile.char_limit - HASHTAG_RESERVE;
    if body.chars().count() > budget {
        let keep = budget - ELLIPSIS.len();
        body = body.chars().take(keep).collect::<String>() + ELLIPSIS;
    }

    let adapted_caption = if tags.is_empty() {
        body
    } else {
        format!("{body}\n\n{}", tags.join(" "))
    };
    let char_count = adapted_caption.chars().count();
    Ok(AdaptedCaption {
        platform: name,
        adapted_caption,
        hashtags: tags,
        char_count,
        char_limit: profile.char_limit,
        within_limit: char_count <= profile.char_limit,
        tips: profile.tips.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_caption_keeps_body_and_caps_hashtags() {
        let adapted = adapt_for_platform(
            "We are here for you. #DVCCC #Hope #Healing #Strength",
            "Facebook",
        )
        .expect("adapted");
        assert_eq!(adapted.platform, "facebook");
        assert_eq!(
            adapted.adapted_caption,
            "We are here for you.\n\n#DVCCC #Hope #Healing"
        );
        assert!(adapted.within_limit);
    }

    #[test]
    fn long_caption_is_truncated_with_ellipsis() {
        let caption = format!("{} #TeenHelp", "a".repeat(400));
        let adapted = adapt_for_platform(&caption, "tiktok").expect("adapted");
        let body = adapted
            .adapted_caption
            .split("\n\n")
            .next()
            .expect("body");
        assert_eq!(body.chars().count(), 100);
        assert!(body.ends_with("..."));
        assert_eq!(adapted.hashtags, vec!["#TeenHelp"]);
        assert!(adapted.within_limit);
    }

    #[test]
    fn rejects_blank_caption_and_unknown_platform() {
        assert!(matches!(
            adapt_for_platform("  ", "facebook"),
            Err(ReachPosterError::Validation(msg)) if msg == "Caption is required"
        ));
        assert!(matches!(
            adapt_for_platform("hello", "myspace"),
            Err(ReachPosterError::Validation(_))
        ));
    }
}
