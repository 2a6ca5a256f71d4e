use rand::Rng;
use serde::Serialize;

use crate::discovery::hashtags;

pub const DEFAULT_CAMPAIGN: &str = "awareness";
const MAX_CAMPAIGN_HASHTAGS: usize = 15;
const PER_CATEGORY: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct CampaignMode {
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub hashtag_focus: &'static [&'static str],
    pub tone: &'static str,
    pub keywords_focus: &'static [&'static str],
    pub priority_hashtags: &'static [&'static str],
}

pub const CAMPAIGN_MODES: [(&str, CampaignMode); 5] = [
    (
        "awareness",
        CampaignMode {
            name: "Awareness",
            icon: "📢",
            description: "General DV awareness and education",
            hashtag_focus: &["awareness", "support", "mental_health", "local"],
            tone: "educational, compassionate, informative",
            keywords_focus: &["awareness", "education", "signs", "prevention", "resources"],
            priority_hashtags: &[
                "#DomesticViolenceAwareness",
                "#BreakTheSilence",
                "#DVAwareness",
                "#EndDV",
            ],
        },
    ),
    (
        "fundraising",
        CampaignMode {
            name: "Fundraising",
            icon: "💝",
            description: "Donor engagement and giving campaigns",
            hashtag_focus: &["support", "local", "empowerment"],
            tone: "grateful, impactful, community-focused",
            keywords_focus: &["donate", "support", "impact", "community", "give", "help"],
            priority_hashtags: &[
                "#GivingTuesday",
                "#NonprofitLove",
                "#SupportSurvivors",
                "#ChesterCountyGives",
                "#CharityMatters",
            ],
        },
    ),
    (
        "events",
        CampaignMode {
            name: "Events",
            icon: "📅",
            description: "Event promotion and RSVPs",
            hashtag_focus: &["local", "awareness", "support"],
            tone: "inviting, exciting, community-oriented",
            keywords_focus: &["event", "join", "community", "Chester County", "RSVP", "attend"],
            priority_hashtags: &[
                "#ChesterCountyEvents",
                "#CommunityEvent",
                "#DVCCC",
                "#LocalEvent",
            ],
        },
    ),
    (
        "youth",
        CampaignMode {
            name: "Youth Outreach",
            icon: "🎯",
            description: "Reaching teens and young adults",
            hashtag_focus: &["youth_focused", "support", "mental_health"],
            tone: "relatable, non-judgmental, authentic, Gen-Z friendly",
            keywords_focus: &["teen", "relationship", "toxic", "healthy", "help", "dating"],
            priority_hashtags: &[
                "#TeenDatingViolence",
                "#HealthyRelationships",
                "#LoveIsRespect",
                "#TeenHelp",
                "#RedFlags",
            ],
        },
    ),
    (
        "volunteer",
        CampaignMode {
            name: "Volunteer Recruitment",
            icon: "🙋",
            description: "Volunteer outreach and recruitment",
            hashtag_focus: &["local", "volunteer", "community"],
            tone: "inviting, community-focused, appreciative",
            keywords_focus: &[
                "volunteer",
                "help",
                "community",
                "give back",
                "make a difference",
            ],
            priority_hashtags: &[
                "#VolunteerOpportunity",
                "#ChesterCountyVolunteers",
                "#GiveBack",
                "#MakeADifference",
            ],
        },
    ),
];

/// Looks a mode up by key, falling back to `awareness` for unknown keys.
pub fn campaign_mode(key: &str) -> (&'static str, &'static CampaignMode) {
    let key = key.trim().to_lowercase();
    let found = CAMPAIGN_MODES.iter().find(|(name, _)| *name == key);
    let (name, mode) = found.unwrap_or(&CAMPAIGN_MODES[0]);
    (name, mode)
}

/// Priority tags first, then three sampled from each focus category.
pub fn campaign_hashtags<R: Rng + ?Sized>(rng: &mut R, mode: &CampaignMode) -> Vec<String> {
    let mut tags: Vec<String> = mode
        .priority_hashtags
        .iter()
        .take(5)
        .map(|tag| tag.to_string())
        .collect();
    for focus in mode.hashtag_focus {
        if let Some(pool) = hashtags::category(focus) {
            tags.extend(hashtags::sample(rng, pool, PER_CATEGORY));
        }
    }
    hashtags::dedupe(tags, MAX_CAMPAIGN_HASHTAGS)
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignPlan {
    pub campaign_mode: &'static str,
    pub config: &'static CampaignMode,
    pub hashtags: Vec<String>,
    pub hashtag_string: String,
    pub keywords: Vec<&'static str>,
    pub tone_guidance: &'static str,
    pub alt_text: String,
}

impl CampaignPlan {
    pub fn build<R: Rng + ?Sized>(rng: &mut R, key: &str, alt_text: String) -> Self {
        let (campaign_mode, config) = campaign_mode(key);
        let hashtags = campaign_hashtags(rng, config);
        Self {
            campaign_mode,
            config,
            hashtag_string: hashtags.join(" "),
            hashtags,
            keywords: config.keywords_focus.iter().take(5).copied().collect(),
            tone_guidance: config.tone,
            alt_text,
        }
    }

    /// Text the alt-text generator describes for a campaign post.
    pub fn alt_text_subject(topic: &str, key: &str) -> String {
        let (_, config) = campaign_mode(key);
        format!("{topic} - {}", config.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn unknown_mode_falls_back_to_awareness() {
        let (name, mode) = campaign_mode("guerrilla");
        assert_eq!(name, "awareness");
        assert_eq!(mode.name, "Awareness");
        assert_eq!(campaign_mode(" Youth ").0, "youth");
    }

    #[test]
    fn hashtags_lead_with_priority_tags_and_cap_at_fifteen() {
        let mut rng = StdRng::seed_from_u64(11);
        for (_, mode) in &CAMPAIGN_MODES {
            let tags = campaign_hashtags(&mut rng, mode);
            assert!(tags.len() <= MAX_CAMPAIGN_HASHTAGS);
            assert_eq!(tags[0], mode.priority_hashtags[0]);
            assert_eq!(hashtags::dedupe(&tags, usize::MAX).len(), tags.len());
        }
    }

    #[test]
    fn plan_keeps_five_keywords() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = CampaignPlan::build(&mut rng, "fundraising", "alt".to_string());
        assert_eq!(plan.keywords, vec!["donate", "support", "impact", "community", "give"]);
        assert_eq!(plan.tone_guidance, "grateful, impactful, community-focused");
        assert_eq!(
            CampaignPlan::alt_text_subject("Gala night", "events"),
            "Gala night - Event promotion and RSVPs"
        );
    }
}
