//! Minute-granular due check for recurring schedules.
//!
//! A schedule time fires when its `HH:MM` equals the current local minute
//! and its day list contains the current weekday digit (0 = Sunday).
//! Missed minutes are never caught up.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};

use crate::error::{ReachPosterError, Result};
use crate::store::LOCAL_MINUTE_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSlot {
    /// 0 = Sunday.
    pub day: u32,
    /// `HH:MM`.
    pub time: String,
    /// `YYYY-MM-DD HH:MM`, unique per minute.
    pub minute_key: String,
}

impl DueSlot {
    pub fn from_local(now: NaiveDateTime) -> Self {
        Self {
            day: now.weekday().num_days_from_sunday(),
            time: format!("{:02}:{:02}", now.hour(), now.minute()),
            minute_key: now.format(LOCAL_MINUTE_FORMAT).to_string(),
        }
    }

    pub fn now() -> Self {
        Self::from_local(Local::now().naive_local())
    }

    pub fn day_digit(&self) -> char {
        char::from_digit(self.day, 10).unwrap_or('0')
    }
}

pub fn is_due(time_of_day: &str, days_of_week: &str, slot: &DueSlot) -> bool {
    time_of_day == slot.time && days_of_week.contains(slot.day_digit())
}

/// Zero-pads `H:MM` and rejects anything outside `00:00..=23:59`.
pub fn normalize_time_of_day(raw: &str) -> Result<String> {
    let invalid = || ReachPosterError::Validation(format!("time must be HH:MM (got '{raw}')"));
    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok(format!("{hour:02}:{minute:02}"))
}

/// Comma separated weekday digits `0..=6`; duplicates dropped, sorted.
pub fn normalize_days_of_week(raw: &str) -> Result<String> {
    let mut days = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let day = match part.parse::<u8>() {
            Ok(day) if day <= 6 => day,
            _ => {
                return Err(ReachPosterError::Validation(format!(
                    "days must be comma separated digits 0-6 (got '{raw}')"
                )))
            }
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }
    if days.is_empty() {
        return Err(ReachPosterError::Validation(
            "at least one day of the week is required".to_string(),
        ));
    }
    days.sort_unstable();
    Ok(days
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(","))
}
