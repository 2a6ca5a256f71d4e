use std::collections::HashSet;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

pub const AWARENESS: &[&str] = &[
    "#DomesticViolenceAwareness",
    "#DVAwareness",
    "#EndDomesticViolence",
    "#BreakTheSilence",
    "#SpeakOut",
    "#NoMoreSilence",
    "#DomesticAbuse",
    "#AbuseAwareness",
    "#StopDomesticViolence",
    "#PurpleRibbon",
];

pub const SUPPORT: &[&str] = &[
    "#YouAreNotAlone",
    "#SurvivorSupport",
    "#HelpIsAvailable",
    "#SafeSpace",
    "#SupportSurvivors",
    "#BelieveSurvivors",
    "#HopeAndHealing",
    "#BreakTheCycle",
    "#SeekHelp",
    "#ThereIsHope",
];

pub const EMPOWERMENT: &[&str] = &[
    "#SurvivorStrong",
    "#Empowerment",
    "#Strength",
    "#Resilience",
    "#CourageToLeave",
    "#NewBeginnings",
    "#HealingJourney",
    "#ReclaimYourLife",
    "#YouMatter",
    "#SelfLove",
];

pub const YOUTH_FOCUSED: &[&str] = &[
    "#TeenDatingViolence",
    "#HealthyRelationships",
    "#RedFlags",
    "#LoveIsRespect",
    "#DatingAbuse",
    "#TeenSafety",
    "#KnowTheSigns",
    "#ToxicRelationships",
    "#SafeRelationships",
    "#TeenHelp",
];

pub const LOCAL: &[&str] = &[
    "#ChesterCounty",
    "#ChesterCountyPA",
    "#DVCCC",
    "#Pennsylvania",
    "#PAstrong",
    "#ChesterCountySupport",
    "#LocalHelp",
];

pub const MENTAL_HEALTH: &[&str] = &[
    "#MentalHealth",
    "#Trauma",
    "#PTSD",
    "#Healing",
    "#Anxiety",
    "#Recovery",
    "#SelfCare",
    "#MentalHealthMatters",
    "#TraumaRecovery",
];

pub const CRISIS: &[&str] = &[
    "#CrisisHelp",
    "#GetHelp",
    "#HotlineHelp",
    "#EmergencyHelp",
    "#SafetyPlanning",
    "#ReachOut",
    "#AskForHelp",
];

pub const VOLUNTEER: &[&str] = &[
    "#VolunteerOpportunity",
    "#ChesterCountyVolunteers",
    "#GiveBack",
    "#MakeADifference",
    "#CommunityService",
    "#NonprofitVolunteer",
    "#VolunteerWork",
    "#HelpOthers",
    "#ServeYourCommunity",
];

pub const COMMUNITY: &[&str] = &[
    "#CommunitySupport",
    "#LocalNonprofit",
    "#ChesterCountyCommunity",
    "#GrassrootsChange",
    "#CommunityMatters",
    "#TogetherWeCan",
];

pub fn category(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "awareness" => Some(AWARENESS),
        "support" => Some(SUPPORT),
        "empowerment" => Some(EMPOWERMENT),
        "youth_focused" => Some(YOUTH_FOCUSED),
        "local" => Some(LOCAL),
        "mental_health" => Some(MENTAL_HEALTH),
        "crisis" => Some(CRISIS),
        "volunteer" => Some(VOLUNTEER),
        "community" => Some(COMMUNITY),
        _ => None,
    }
}

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").unwrap());
static HASHTAG_WITH_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+\s*").unwrap());

pub fn extract(text: &str) -> Vec<String> {
    HASHTAG_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Removes every hashtag (and the whitespace after it) and trims the result.
pub fn strip(text: &str) -> String {
    HASHTAG_WITH_SPACE_RE
        .replace_all(text, "")
        .trim()
        .to_string()
}

/// Keeps first occurrences, comparing case-insensitively, up to `max` tags.
pub fn dedupe<I, S>(tags: I, max: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    if max == 0 {
        return out;
    }
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || !seen.insert(tag.to_lowercase()) {
            continue;
        }
        out.push(tag.to_string());
        if out.len() == max {
            break;
        }
    }
    out
}

/// Explicit hashtags plus those written into the caption, deduplicated.
pub fn merged(explicit: &[String], caption: &str) -> Vec<String> {
    dedupe(explicit.iter().cloned().chain(extract(caption)), usize::MAX)
}

pub fn sample<R: Rng + ?Sized>(rng: &mut R, tags: &[&str], count: usize) -> Vec<String> {
    tags.choose_multiple(rng, count.min(tags.len()))
        .map(|tag| tag.to_string())
        .collect()
}

/// 4 awareness, 4 support, 3 youth-focused and 3 local tags.
pub fn core_mix<R: Rng + ?Sized>(rng: &mut R) -> Vec<String> {
    let mut tags = sample(rng, AWARENESS, 4);
    tags.extend(sample(rng, SUPPORT, 4));
    tags.extend(sample(rng, YOUTH_FOCUSED, 3));
    tags.extend(sample(rng, LOCAL, 3));
    tags
}

/// Lines of a model reply that look like hashtags.
pub fn parse_model_tags(reply: &str, max: usize) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .take(max)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn extract_and_strip() {
        let caption = "We are here. #DVCCC #YouAreNotAlone\nCall anytime";
        assert_eq!(extract(caption), vec!["#DVCCC", "#YouAreNotAlone"]);
        assert_eq!(strip(caption), "We are here. Call anytime");
    }

    #[test]
    fn dedupe_ignores_case_and_caps() {
        let tags = ["#Hope", "#hope", "#HOPE", "#Healing", "#Strength"];
        assert_eq!(dedupe(tags, 2), vec!["#Hope", "#Healing"]);
    }

    #[test]
    fn core_mix_draws_from_each_category() {
        let mut rng = StdRng::seed_from_u64(7);
        let tags = core_mix(&mut rng);
        assert_eq!(tags.len(), 14);
        assert_eq!(tags.iter().filter(|t| LOCAL.contains(&t.as_str())).count(), 3);
        assert_eq!(dedupe(&tags, usize::MAX).len(), 14);
    }

    #[test]
    fn model_tags_keep_hash_lines_only() {
        let reply = "Here you go:\n#HealthyLove\n  #TeenTalk \nnot a tag";
        assert_eq!(parse_model_tags(reply, 10), vec!["#HealthyLove", "#TeenTalk"]);
    }

    #[test]
    fn categories_resolve_by_name() {
        assert_eq!(category("crisis").map(<[_]>::len), Some(7));
        assert!(category("unknown").is_none());
    }
}
