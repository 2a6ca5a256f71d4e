use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
struct AwarenessMonth {
    key: &'static str,
    month: u32,
    name: &'static str,
    short: &'static str,
    hashtags: &'static [&'static str],
}

const AWARENESS_MONTHS: [AwarenessMonth; 3] = [
    AwarenessMonth {
        key: "february",
        month: 2,
        name: "Teen Dating Violence Awareness Month",
        short: "TDVAM",
        hashtags: &[
            "#TDVAM",
            "#LoveIsRespect",
            "#TeenDatingViolenceAwareness",
            "#HealthyRelationships",
        ],
    },
    AwarenessMonth {
        key: "april",
        month: 4,
        name: "Sexual Assault Awareness Month",
        short: "SAAM",
        hashtags: &["#SAAM", "#BelieveSurvivors", "#SexualAssaultAwarenessMonth"],
    },
    AwarenessMonth {
        key: "october",
        month: 10,
        name: "Domestic Violence Awareness Month",
        short: "DVAM",
        hashtags: &[
            "#DVAM",
            "#PurpleThursday",
            "#DomesticViolenceAwarenessMonth",
            "#WearPurple",
        ],
    },
];

#[derive(Debug, Clone, Copy)]
enum DayRule {
    Fixed(u32),
    /// 1-based occurrence of a weekday in the month.
    Nth(u8, Weekday),
    Last(Weekday),
}

#[derive(Debug, Clone, Copy)]
struct SpecialDay {
    key: &'static str,
    month: u32,
    rule: DayRule,
    name: &'static str,
    description: &'static str,
    hashtags: &'static [&'static str],
}

const SPECIAL_DAYS: [SpecialDay; 4] = [
    SpecialDay {
        key: "purple_thursday",
        month: 10,
        rule: DayRule::Nth(3, Weekday::Thu),
        name: "Purple Thursday",
        description: "Wear purple to show support for domestic violence survivors",
        hashtags: &["#PurpleThursday", "#WearPurple", "#DVAM"],
    },
    SpecialDay {
        key: "international_womens_day",
        month: 3,
        rule: DayRule::Fixed(8),
        name: "International Women's Day",
        description: "Celebrating women and raising awareness for gender equality",
        hashtags: &["#InternationalWomensDay", "#IWD", "#WomensRights"],
    },
    SpecialDay {
        key: "denim_day",
        month: 4,
        rule: DayRule::Last(Weekday::Wed),
        name: "Denim Day",
        description: "Wear denim to support survivors of sexual assault",
        hashtags: &["#DenimDay", "#SAAM", "#BelieveSurvivors"],
    },
    SpecialDay {
        key: "domestic_violence_memorial_day",
        month: 10,
        rule: DayRule::Nth(1, Weekday::Mon),
        name: "National Day of Remembrance for Murder Victims of Domestic Violence",
        description: "Honoring those who lost their lives to domestic violence",
        hashtags: &["#DVAM", "#RememberTheVictims", "#EndDV"],
    },
];

impl SpecialDay {
    fn date_in(&self, year: i32) -> Option<NaiveDate> {
        match self.rule {
            DayRule::Fixed(day) => NaiveDate::from_ymd_opt(year, self.month, day),
            DayRule::Nth(n, weekday) => {
                NaiveDate::from_weekday_of_month_opt(year, self.month, weekday, n)
            }
            DayRule::Last(weekday) => last_weekday_of_month(year, self.month, weekday),
        }
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_signed(Duration::days(i64::from(back)))
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Serialize)]
pub struct MonthEntry {
    pub name: &'static str,
    pub short: &'static str,
    pub hashtags: &'static [&'static str],
    pub month_name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecialDayEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub date: String,
    pub formatted_date: String,
    pub hashtags: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct AwarenessCalendar {
    pub year: i32,
    /// Keyed by month number.
    pub months: std::collections::BTreeMap<u32, MonthEntry>,
    pub special_days: Vec<SpecialDayEntry>,
}

fn special_entry(day: &SpecialDay, date: NaiveDate) -> SpecialDayEntry {
    SpecialDayEntry {
        key: day.key,
        name: day.name,
        description: day.description,
        date: date.format("%Y-%m-%d").to_string(),
        formatted_date: date.format("%B %d, %Y").to_string(),
        hashtags: day.hashtags,
    }
}

/// Awareness months and special days of `year`, optionally limited to one month.
pub fn awareness_calendar(year: i32, month: Option<u32>) -> AwarenessCalendar {
    let in_scope = |m: u32| month.map_or(true, |wanted| wanted == m);
    let months = AWARENESS_MONTHS
        .iter()
        .filter(|entry| in_scope(entry.month))
        .map(|entry| {
            (
                entry.month,
                MonthEntry {
                    name: entry.name,
                    short: entry.short,
                    hashtags: entry.hashtags,
                    month_name: MONTH_NAMES[(entry.month - 1) as usize],
                },
            )
        })
        .collect();

    let mut special_days: Vec<SpecialDayEntry> = SPECIAL_DAYS
        .iter()
        .filter(|day| in_scope(day.month))
        .filter_map(|day| day.date_in(year).map(|date| special_entry(day, date)))
        .collect();
    special_days.sort_by(|a, b| a.date.cmp(&b.date));

    AwarenessCalendar {
        year,
        months,
        special_days,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpcomingEvent {
    Month {
        key: &'static str,
        name: &'static str,
        short: &'static str,
        start_date: String,
        hashtags: &'static [&'static str],
        days_away: i64,
    },
    SpecialDay {
        key: &'static str,
        name: &'static str,
        description: &'static str,
        date: String,
        formatted_date: String,
        hashtags: &'static [&'static str],
        days_away: i64,
    },
}

impl UpcomingEvent {
    fn sort_key(&self) -> &str {
        match self {
            UpcomingEvent::Month { start_date, .. } => start_date,
            UpcomingEvent::SpecialDay { date, .. } => date,
        }
    }
}

const MAX_LOOKAHEAD_DAYS: i64 = 3660;

/// Awareness months starting this or next month and special days within `days_ahead` of `today`.
pub fn upcoming_awareness(today: NaiveDate, days_ahead: i64) -> Vec<UpcomingEvent> {
    let end = today + Duration::days(days_ahead.clamp(0, MAX_LOOKAHEAD_DAYS));
    let current_month_start = today.with_day(1).unwrap_or(today);
    let mut upcoming = Vec::new();

    for offset in 0..2u32 {
        let month = (today.month() - 1 + offset) % 12 + 1;
        let year = if month >= today.month() {
            today.year()
        } else {
            today.year() + 1
        };
        let Some(entry) = AWARENESS_MONTHS.iter().find(|entry| entry.month == month) else {
            continue;
        };
        let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) else {
            continue;
        };
        if start <= end && start >= current_month_start {
            upcoming.push(UpcomingEvent::Month {
                key: entry.key,
                name: entry.name,
                short: entry.short,
                start_date: start.format("%Y-%m-%d").to_string(),
                hashtags: entry.hashtags,
                days_away: (start - today).num_days().max(0),
            });
        }
    }

    for day in &SPECIAL_DAYS {
        let next = [today.year(), today.year() + 1]
            .into_iter()
            .filter_map(|year| day.date_in(year))
            .find(|date| *date >= today && *date <= end);
        if let Some(date) = next {
            let entry = special_entry(day, date);
            upcoming.push(UpcomingEvent::SpecialDay {
                key: entry.key,
                name: entry.name,
                description: entry.description,
                date: entry.date,
                formatted_date: entry.formatted_date,
                hashtags: entry.hashtags,
                days_away: (date - today).num_days(),
            });
        }
    }

    upcoming.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
    upcoming
}

/// The Tuesday after the fourth Thursday of November.
pub fn giving_tuesday(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Thu, 4)
        .map(|thanksgiving| thanksgiving + Duration::days(5))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn giving_tuesday_follows_thanksgiving() {
        assert_eq!(giving_tuesday(2024), Some(date(2024, 12, 3)));
        assert_eq!(giving_tuesday(2025), Some(date(2025, 12, 2)));
    }

    #[test]
    fn special_day_rules_resolve() {
        let calendar = awareness_calendar(2025, None);
        let dates: Vec<(&str, &str)> = calendar
            .special_days
            .iter()
            .map(|d| (d.key, d.date.as_str()))
            .collect();
        assert_eq!(
            dates,
            vec![
                ("international_womens_day", "2025-03-08"),
                ("denim_day", "2025-04-30"),
                ("domestic_violence_memorial_day", "2025-10-06"),
                ("purple_thursday", "2025-10-16"),
            ]
        );
        assert_eq!(calendar.months.len(), 3);
        assert_eq!(calendar.special_days[1].formatted_date, "April 30, 2025");
    }

    #[test]
    fn month_filter_limits_both_lists() {
        let october = awareness_calendar(2025, Some(10));
        assert_eq!(october.months.len(), 1);
        assert_eq!(october.months[&10].month_name, "October");
        assert_eq!(october.special_days.len(), 2);
        assert!(awareness_calendar(2025, Some(7)).months.is_empty());
    }

    #[test]
    fn upcoming_window_from_late_september() {
        let upcoming = upcoming_awareness(date(2025, 9, 20), 30);
        let keys: Vec<&str> = upcoming
            .iter()
            .map(|event| match event {
                UpcomingEvent::Month { key, .. } => *key,
                UpcomingEvent::SpecialDay { key, .. } => *key,
            })
            .collect();
        assert_eq!(
            keys,
            vec!["october", "domestic_violence_memorial_day", "purple_thursday"]
        );
        match &upcoming[0] {
            UpcomingEvent::Month { days_away, .. } => assert_eq!(*days_away, 11),
            other => panic!("expected month, got {other:?}"),
        }
    }

    #[test]
    fn upcoming_crosses_year_end() {
        assert!(upcoming_awareness(date(2025, 12, 20), 60).is_empty());
        let february = upcoming_awareness(date(2026, 1, 15), 30);
        assert!(matches!(
            &february[0],
            UpcomingEvent::Month { key: "february", start_date, .. } if start_date == "2026-02-01"
        ));
    }
}
