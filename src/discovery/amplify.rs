use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::warn;

use super::hashtags;
use super::seo::{self, PostingTimes, SeoAnalysis};
use super::{score, DiscoveryScore, ScoreInput};
use crate::config::OrganizationConfig;
use crate::interfaces::providers::{CompletionRequest, TextGenerator};

pub const MAX_HASHTAGS: usize = 20;
const MAX_MODEL_HASHTAGS: usize = 10;
const MAX_ALT_TEXT_CHARS: usize = 150;
const MAX_KEYWORDS: usize = 7;

pub const FALLBACK_KEYWORDS: [&str; 5] = ["support", "help", "healing", "strength", "hope"];

const CTA_SUFFIXES: [&str; 5] = [
    "\n\n💜 Help is available. You are not alone.",
    "\n\n💜 If you or someone you know needs help, reach out.",
    "\n\n💜 We are here for you. You matter.",
    "\n\n💜 Support is just a call away. You deserve safety.",
    "\n\n💜 You are stronger than you know. Help is here.",
];

/// Lowercase phrases whose presence means the caption already asks the reader to act.
const EXISTING_CTA_MARKERS: [&str; 5] = [
    "help is",
    "reach out",
    "you are not alone",
    "call",
    "here for you",
];

#[derive(Debug, Clone, Serialize)]
pub struct AmplifyReport {
    pub optimized_caption: String,
    pub hashtags: Vec<String>,
    pub hashtag_string: String,
    pub alt_text: String,
    pub keywords: Vec<String>,
    pub discovery_score: DiscoveryScore,
    pub tips: Vec<String>,
    pub seo_analysis: SeoAnalysis,
    pub posting_times: PostingTimes,
}

/// Discovery optimizer. Every model-backed step has a deterministic fallback,
/// so a missing or failing text generator only lowers quality.
pub struct ReachAmplify {
    text: Option<Arc<dyn TextGenerator>>,
    organization: OrganizationConfig,
}

impl ReachAmplify {
    pub fn new(text: Option<Arc<dyn TextGenerator>>, organization: OrganizationConfig) -> Self {
        Self { text, organization }
    }

    async fn ask(&self, request: CompletionRequest, step: &'static str) -> Option<String> {
        let text = self.text.as_ref()?;
        match text.complete(&request).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                warn!(step, error = %err, "Discovery step fell back");
                None
            }
        }
    }

    pub async fn optimize(&self, caption: &str, image_prompt: &str, topic: &str) -> AmplifyReport {
        let hashtags = self.generate_hashtags(topic, caption).await;
        let alt_text = self.alt_text(image_prompt).await;
        let keywords = self.extract_keywords(topic).await;
        let optimized_caption = optimize_caption(caption);
        let discovery_score = score(&ScoreInput {
            caption: &optimized_caption,
            hashtags: &hashtags,
            keywords: &keywords,
            local_terms: &self.organization.local_terms,
        });
        let seo_analysis = seo::analyze(&optimized_caption, &keywords);
        AmplifyReport {
            hashtag_string: hashtags.join(" "),
            tips: engagement_tips(topic),
            optimized_caption,
            hashtags,
            alt_text,
            keywords,
            discovery_score,
            seo_analysis,
            posting_times: seo::best_posting_times(),
        }
    }

    /// Core category sample plus up to ten contextual tags from the model, max 20.
    pub async fn generate_hashtags(&self, topic: &str, caption: &str) -> Vec<String> {
        let excerpt: String = caption.chars().take(200).collect();
        let request = CompletionRequest::new(
            "You are a social media expert for a domestic violence support center. Generate \
             hashtags that help reach people in need, especially young people searching for \
             help: questioning whether a relationship is healthy, looking for resources, feeling \
             scared or trapped, or seeking support.",
            format!(
                "Generate 10 unique Instagram hashtags for this {} post:\nTopic: {topic}\n\
                 Caption: {}\n\nReturn ONLY hashtags, one per line, including the # symbol.",
                self.organization.short_name,
                if excerpt.is_empty() { "N/A" } else { excerpt.as_str() }
            ),
        )
        .max_tokens(200)
        .temperature(0.8);
        let model_tags = self
            .ask(request, "hashtags")
            .await
            .map(|reply| hashtags::parse_model_tags(&reply, MAX_MODEL_HASHTAGS))
            .unwrap_or_default();

        let mut tags = hashtags::core_mix(&mut rand::thread_rng());
        tags.extend(model_tags);
        hashtags::dedupe(tags, MAX_HASHTAGS)
    }

    pub async fn alt_text(&self, image_prompt: &str) -> String {
        let request = CompletionRequest::new(
            "You write concise, descriptive alt text for images. Describe what is visually in \
             the image in under 125 characters, help screen reader users, include relevant \
             keywords naturally, and never start with 'Image of' or 'Photo of'. No hashtags.",
            format!(
                "Write alt text for an Instagram image.\nThe image shows: {image_prompt}\n\n\
                 Keep it under 125 characters."
            ),
        )
        .max_tokens(60)
        .temperature(0.5);
        match self.ask(request, "alt_text").await {
            Some(reply) => {
                let cleaned = reply.trim().trim_matches(|c| c == '"' || c == '\'');
                if cleaned.is_empty() {
                    fallback_alt_text(image_prompt).to_string()
                } else {
                    cleaned.chars().take(MAX_ALT_TEXT_CHARS).collect()
                }
            }
            None => fallback_alt_text(image_prompt).to_string(),
        }
    }

    pub async fn extract_keywords(&self, topic: &str) -> Vec<String> {
        let request = CompletionRequest::new(
            "Extract keywords that someone in need might search for, especially a young person \
             in an unhealthy relationship who is looking for help or support.",
            format!(
                "Extract 5-7 searchable keywords from this topic: {topic}\n\n\
                 Return only keywords, comma-separated."
            ),
        )
        .max_tokens(50)
        .temperature(0.5);
        let keywords: Vec<String> = self
            .ask(request, "keywords")
            .await
            .map(|reply| {
                reply
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .take(MAX_KEYWORDS)
                    .collect()
            })
            .unwrap_or_default();
        if keywords.is_empty() {
            FALLBACK_KEYWORDS.iter().map(|k| k.to_string()).collect()
        } else {
            keywords
        }
    }
}

/// Appends a supportive call to action unless the caption already has one.
pub fn optimize_caption(caption: &str) -> String {
    let lower = caption.to_lowercase();
    if EXISTING_CTA_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return caption.to_string();
    }
    let suffix = CTA_SUFFIXES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(CTA_SUFFIXES[0]);
    format!("{}{suffix}", caption.trim_end())
}

pub fn fallback_alt_text(image_prompt: &str) -> &'static str {
    let lower = image_prompt.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["sunrise", "sunset"]) {
        "Warm sunrise over a peaceful landscape symbolizing hope and new beginnings"
    } else if has(&["hands"]) {
        "Two hands joined together in a supportive, caring gesture"
    } else if has(&["bird", "flight"]) {
        "Birds soaring freely against a warm sky, symbolizing freedom"
    } else if has(&["tree"]) {
        "Strong oak tree standing resilient, symbolizing strength and growth"
    } else if has(&["path", "road"]) {
        "A winding path through nature, representing the journey forward"
    } else if has(&["candle"]) {
        "Soft candlelight creating a warm, peaceful atmosphere"
    } else if has(&["flower", "garden"]) {
        "Flowers blooming in natural light, symbolizing growth and renewal"
    } else {
        "Peaceful image representing hope, healing, and support"
    }
}

pub fn engagement_tips(topic: &str) -> Vec<String> {
    let mut tips = vec![
        "Post between 11am-1pm or 7pm-9pm for best engagement",
        "Reply to comments within the first hour to boost visibility",
        "Share to Stories with a link sticker",
        "Use the question sticker in Stories to encourage engagement",
        "Pin supportive or helpful comments to the top",
    ];
    let lower = topic.to_lowercase();
    if lower.contains("teen") || lower.contains("young") {
        tips.insert(0, "Consider the Reels format for higher reach with younger audiences");
    }
    if lower.contains("awareness") {
        tips.insert(0, "Tag relevant awareness accounts for potential reshares");
    }
    tips.into_iter().take(5).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReachPosterError, Result};
    use async_trait::async_trait;

    struct Scripted(&'static str);

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl TextGenerator for Broken {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Err(ReachPosterError::Http("down".to_string()))
        }
    }

    fn amplify(text: Option<Arc<dyn TextGenerator>>) -> ReachAmplify {
        ReachAmplify::new(text, OrganizationConfig::default())
    }

    #[test]
    fn caption_with_cta_is_untouched() {
        let caption = "We are here for you, always.";
        assert_eq!(optimize_caption(caption), caption);
        let optimized = optimize_caption("A new season begins.  ");
        assert!(optimized.starts_with("A new season begins.\n\n💜"));
    }

    #[test]
    fn alt_text_fallback_follows_keyword_order() {
        assert!(fallback_alt_text("Hands near a candle").starts_with("Two hands"));
        assert!(fallback_alt_text("Candle on a table").starts_with("Soft candlelight"));
        assert!(fallback_alt_text("Rain on glass").starts_with("Peaceful image"));
    }

    #[test]
    fn awareness_topics_surface_extra_tips() {
        let tips = engagement_tips("Teen awareness week");
        assert_eq!(tips.len(), 5);
        assert!(tips[0].contains("awareness accounts"));
        assert!(tips[1].contains("Reels"));
        assert_eq!(engagement_tips("Hope").len(), 5);
    }

    #[tokio::test]
    async fn without_a_model_everything_falls_back() {
        let amplify = amplify(None);
        assert_eq!(amplify.extract_keywords("Hope").await, FALLBACK_KEYWORDS);
        assert!(amplify.alt_text("a lit candle").await.starts_with("Soft candlelight"));
        let tags = amplify.generate_hashtags("Hope", "").await;
        assert_eq!(tags.len(), 14);

        let failing = ReachAmplify::new(Some(Arc::new(Broken)), OrganizationConfig::default());
        assert_eq!(failing.extract_keywords("Hope").await, FALLBACK_KEYWORDS);
    }

    #[tokio::test]
    async fn model_replies_are_cleaned_and_capped() {
        let quoted = amplify(Some(Arc::new(Scripted("\"Soft light over a quiet kitchen table\""))));
        assert_eq!(
            quoted.alt_text("kitchen").await,
            "Soft light over a quiet kitchen table"
        );

        let keywords = amplify(Some(Arc::new(Scripted("a, b, c, d, e, f, g, h, i"))));
        assert_eq!(keywords.extract_keywords("topic").await.len(), 7);

        let tags = amplify(Some(Arc::new(Scripted(
            "#One\n#Two\n#Three\n#Four\n#Five\n#Six\n#Seven\n#Eight\n#Nine\n#Ten\n#Eleven",
        ))));
        let generated = tags.generate_hashtags("topic", "caption").await;
        assert_eq!(generated.len(), MAX_HASHTAGS);
        assert!(generated.contains(&"#One".to_string()));
    }

    #[tokio::test]
    async fn report_scores_the_optimized_caption() {
        let report = amplify(None)
            .optimize("Hope lives here in Chester County.", "hands", "Hope")
            .await;
        assert!(report.optimized_caption.contains("💜"));
        assert!(report.discovery_score.total <= 100);
        assert_eq!(report.hashtag_string.split(' ').count(), report.hashtags.len());
        assert_eq!(report.alt_text, fallback_alt_text("hands"));
    }
}
