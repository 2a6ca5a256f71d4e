//! Read-only marketing data served by the `/api/*` catalog endpoints.
//!
//! Everything here is static or computed from the calendar; nothing touches
//! the store or an upstream client except campaign alt text, which the caller
//! supplies.

pub mod awareness;
pub mod campaigns;
pub mod impact;
pub mod platforms;

use serde::Serialize;

pub use awareness::{awareness_calendar, giving_tuesday, upcoming_awareness};
pub use campaigns::{
    campaign_hashtags, campaign_mode, CampaignMode, CampaignPlan, CAMPAIGN_MODES, DEFAULT_CAMPAIGN,
};
pub use impact::{calculate_impact, ImpactReport, IMPACT_PRESETS};
pub use platforms::{adapt_for_platform, platform, AdaptedCaption, PlatformProfile, PLATFORMS};

pub const SUGGESTED_THEMES: [&str; 8] = [
    "We see you, we believe you, and we are here for you",
    "Free confidential support available in Chester County",
    "Your journey to healing starts with one step",
    "You deserve to feel safe - help is available",
    "Hope lives here at DVCCC",
    "Our counselors are here to listen without judgment",
    "Every survivor has a story of strength",
    "Building healthy relationships after trauma",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeType {
    Supportive,
    Resource,
    Empowerment,
    Educational,
}

impl ThemeType {
    fn as_str(self) -> &'static str {
        match self {
            ThemeType::Supportive => "supportive",
            ThemeType::Resource => "resource",
            ThemeType::Empowerment => "empowerment",
            ThemeType::Educational => "educational",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Trending,
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmartTheme {
    pub theme: &'static str,
    #[serde(rename = "type")]
    pub kind: ThemeType,
    pub priority: Priority,
    pub seo_keywords: [&'static str; 3],
    pub aio_query: &'static str,
}

pub const SMART_THEMES: [SmartTheme; 8] = [
    SmartTheme {
        theme: "We see you, we believe you, and we are here for you",
        kind: ThemeType::Supportive,
        priority: Priority::High,
        seo_keywords: ["domestic violence support", "DV help", "believe survivors"],
        aio_query: "where can i get help for domestic violence",
    },
    SmartTheme {
        theme: "Free confidential support in Chester County",
        kind: ThemeType::Resource,
        priority: Priority::High,
        seo_keywords: ["free DV services", "Chester County help", "confidential support"],
        aio_query: "free domestic violence help near me",
    },
    SmartTheme {
        theme: "Your journey to healing starts with one step",
        kind: ThemeType::Empowerment,
        priority: Priority::Medium,
        seo_keywords: ["healing from abuse", "trauma recovery", "survivor healing"],
        aio_query: "how do i start healing from abuse",
    },
    SmartTheme {
        theme: "You deserve to feel safe - help is available",
        kind: ThemeType::Supportive,
        priority: Priority::High,
        seo_keywords: ["feel safe", "abuse help", "safety resources"],
        aio_query: "i dont feel safe at home what do i do",
    },
    SmartTheme {
        theme: "Recognizing warning signs in relationships",
        kind: ThemeType::Educational,
        priority: Priority::High,
        seo_keywords: ["red flags relationship", "abuse signs", "unhealthy relationship"],
        aio_query: "is my relationship abusive",
    },
    SmartTheme {
        theme: "Our counselors listen without judgment",
        kind: ThemeType::Resource,
        priority: Priority::Medium,
        seo_keywords: ["DV counseling", "free counseling", "support services"],
        aio_query: "where can i talk to someone about abuse",
    },
    SmartTheme {
        theme: "Every survivor has a story of strength",
        kind: ThemeType::Empowerment,
        priority: Priority::Medium,
        seo_keywords: ["survivor stories", "abuse survivor", "strength"],
        aio_query: "am i strong enough to leave",
    },
    SmartTheme {
        theme: "Building healthy relationships after trauma",
        kind: ThemeType::Educational,
        priority: Priority::Medium,
        seo_keywords: ["healthy relationships", "dating after abuse", "trust again"],
        aio_query: "can i have a healthy relationship after abuse",
    },
];

/// `trending` keeps high-priority themes, `all` (or nothing) keeps every theme,
/// anything else filters by theme type.
pub fn smart_themes(preference: Option<&str>) -> Vec<&'static SmartTheme> {
    let preference = preference
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_lowercase);
    SMART_THEMES
        .iter()
        .filter(|theme| match preference.as_deref() {
            None | Some("all") => true,
            Some("trending") => matches!(theme.priority, Priority::Trending | Priority::High),
            Some(kind) => theme.kind.as_str() == kind,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct FundraisingGuide {
    pub donor_hashtags: [&'static str; 8],
    pub impact_statements: [&'static str; 3],
    pub tips: [&'static str; 3],
}

pub fn fundraising_guide() -> FundraisingGuide {
    FundraisingGuide {
        donor_hashtags: [
            "#GivingTuesday",
            "#NonprofitLove",
            "#CharityMatters",
            "#SupportSurvivors",
            "#ChesterCountyGives",
            "#GiveBack",
            "#MakeADifference",
            "#DonateForGood",
        ],
        impact_statements: [
            "Your gift provides safety and hope to survivors",
            "Every donation funds critical services for families in crisis",
            "100% of donations stay local in Chester County",
        ],
        tips: [
            "Share specific impact metrics (e.g., '$50 provides X hours of counseling')",
            "Use storytelling to connect emotionally with donors",
            "Include clear donation CTA with link",
        ],
    }
}

pub const DEFAULT_EVENT_TYPE: &str = "community";
pub const DEFAULT_EVENT_LOCATION: &str = "Chester County";

#[derive(Debug, Clone, Serialize)]
pub struct EventPlan {
    pub event_name: String,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    pub hashtags: Vec<String>,
    pub hashtag_string: String,
    pub ctas: Vec<String>,
    pub local_keywords: Vec<String>,
}

pub fn optimize_event(
    event_name: &str,
    event_type: &str,
    event_date: Option<&str>,
    location: &str,
) -> EventPlan {
    let type_tag = match event_type.replace(' ', "") {
        squashed if squashed.is_empty() => "#Event".to_string(),
        squashed => format!("#{squashed}"),
    };
    let hashtags: Vec<String> = [
        "#ChesterCountyEvents",
        "#CommunityEvent",
        "#DVCCC",
        type_tag.as_str(),
        "#ChesterCounty",
        "#ChesterCountyPA",
        "#LocalEvent",
    ]
    .iter()
    .map(|tag| tag.to_string())
    .collect();

    EventPlan {
        event_name: event_name.to_string(),
        event_type: event_type.to_string(),
        event_date: event_date.map(str::to_string),
        hashtag_string: hashtags.join(" "),
        hashtags,
        ctas: vec![
            format!("Join us for {event_name}! RSVP at dvccc.com/events"),
            format!("Save the date for {event_name} - link in bio to register"),
            format!("You're invited! {event_name} - details and registration in bio"),
        ],
        local_keywords: vec![
            "Chester County".to_string(),
            "local event".to_string(),
            location.to_string(),
        ],
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VolunteerRole {
    pub title: &'static str,
    pub commitment: &'static str,
    /// Training hours.
    pub training: u32,
    pub description: &'static str,
    pub skills: [&'static str; 3],
}

pub const VOLUNTEER_ROLES: [(&str, VolunteerRole); 5] = [
    (
        "hotline",
        VolunteerRole {
            title: "Crisis Hotline Volunteer",
            commitment: "4 hrs/week",
            training: 40,
            description: "Provide compassionate support to callers on our 24/7 crisis hotline",
            skills: ["Active listening", "Empathy", "Crisis intervention"],
        },
    ),
    (
        "shelter",
        VolunteerRole {
            title: "Shelter Support",
            commitment: "Flexible",
            training: 20,
            description: "Assist with day-to-day operations at our emergency shelter",
            skills: ["Reliability", "Compassion", "Flexibility"],
        },
    ),
    (
        "children",
        VolunteerRole {
            title: "Children's Program",
            commitment: "2-4 hrs/week",
            training: 25,
            description: "Support therapeutic activities for children staying at the shelter",
            skills: ["Child development", "Patience", "Creativity"],
        },
    ),
    (
        "admin",
        VolunteerRole {
            title: "Administrative",
            commitment: "Remote OK",
            training: 8,
            description: "Help with office tasks, data entry, and administrative support",
            skills: ["Organization", "Computer skills", "Attention to detail"],
        },
    ),
    (
        "event",
        VolunteerRole {
            title: "Event Support",
            commitment: "As needed",
            training: 4,
            description: "Assist with fundraising events, awareness campaigns, and community outreach",
            skills: ["Teamwork", "Communication", "Enthusiasm"],
        },
    ),
];

pub fn volunteer_role(key: &str) -> Option<&'static VolunteerRole> {
    VOLUNTEER_ROLES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, role)| role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_theme_preferences() {
        assert_eq!(smart_themes(None).len(), 8);
        assert_eq!(smart_themes(Some("all")).len(), 8);
        assert_eq!(smart_themes(Some("trending")).len(), 4);
        let educational = smart_themes(Some("Educational"));
        assert_eq!(educational.len(), 2);
        assert!(educational.iter().all(|t| t.kind == ThemeType::Educational));
        assert!(smart_themes(Some("seasonal")).is_empty());
    }

    #[test]
    fn event_plan_squashes_type_into_tag() {
        let plan = optimize_event("Purple Gala", "fundraising gala", None, "West Chester");
        assert_eq!(plan.hashtags[3], "#fundraisinggala");
        assert_eq!(plan.hashtags.len(), 7);
        assert_eq!(plan.ctas[0], "Join us for Purple Gala! RSVP at dvccc.com/events");
        assert_eq!(plan.local_keywords[2], "West Chester");

        let untyped = optimize_event("Walk", "", None, DEFAULT_EVENT_LOCATION);
        assert_eq!(untyped.hashtags[3], "#Event");
    }

    #[test]
    fn volunteer_roles_resolve_by_key() {
        assert_eq!(volunteer_role("hotline").map(|r| r.training), Some(40));
        assert!(volunteer_role("driver").is_none());
    }
}
