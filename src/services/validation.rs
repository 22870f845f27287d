use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Field, KnowledgeBase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("invalid service")]
    UnknownService,
    #[error("invalid location")]
    UnknownLocation,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid time")]
    InvalidTime,
    #[error("time outside hours")]
    OutsideHours,
    #[error("invalid contact")]
    InvalidContact,
}

impl FieldError {
    /// What the assistant says back when a chat answer is rejected.
    pub fn reprompt(&self) -> &'static str {
        match self {
            FieldError::UnknownService => {
                "Invalid service. Please re-enter a valid service from the list."
            }
            FieldError::UnknownLocation => {
                "Invalid location. Please re-enter a valid location from the list."
            }
            FieldError::InvalidDate => {
                "Invalid date format. Please re-enter (e.g., 21 Dec or 2026-02-10)."
            }
            FieldError::InvalidTime => "Invalid time format. Please re-enter (e.g., 10:30 AM).",
            FieldError::OutsideHours => {
                "That time is outside the location's operating hours. Please enter a time within hours."
            }
            FieldError::InvalidContact => {
                "Invalid contact. Please re-enter your name and phone/email."
            }
        }
    }
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("iso date regex must compile"))
}

fn day_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b\d{1,2}(st|nd|rd|th)?\s*(jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|may|june?|july?|aug(ust)?|sep(t(ember)?)?|oct(ober)?|nov(ember)?|dec(ember)?)\b",
        )
        .expect("day-month regex must compile")
    })
}

fn clock_24h_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("24h time regex must compile")
    })
}

fn clock_12h_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})(?::([0-5]\d))?\s*(am|pm)\b").expect("12h time regex must compile")
    })
}

fn hours_window_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})").expect("hours regex must compile")
    })
}

pub fn find_service(value: &str, kb: &KnowledgeBase) -> Option<String> {
    let value = value.trim().to_lowercase();
    kb.service_names()
        .into_iter()
        .find(|n| n.to_lowercase() == value)
        .map(str::to_string)
}

pub fn find_location(value: &str, kb: &KnowledgeBase) -> Option<String> {
    let value = value.trim().to_lowercase();
    kb.location_names()
        .into_iter()
        .find(|n| n.to_lowercase() == value)
        .map(str::to_string)
}

/// `YYYY-MM-DD` or `<day> <month>`. Calendar validity is not checked.
pub fn valid_date(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    iso_date_re().is_match(&v) || day_month_re().is_match(&v)
}

/// The first clock token in `value`, verbatim.
pub fn extract_time(value: &str) -> Option<String> {
    clock_12h_re()
        .find(value)
        .or_else(|| clock_24h_re().find(value))
        .map(|m| m.as_str().to_string())
}

pub fn time_to_minutes(value: &str) -> Option<u32> {
    let v = value.trim().to_lowercase();
    if let Some(caps) = clock_12h_re().captures(&v) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse::<u32>()).ok()?;
        let offset = if &caps[3] == "pm" { 12 * 60 } else { 0 };
        return Some((hour % 12) * 60 + minute + offset);
    }
    let caps = clock_24h_re().captures(&v)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    Some(hour * 60 + minute)
}

/// `(start, end)` minutes of an `HH:MM-HH:MM` window.
pub fn parse_window(hours: &str) -> Option<(u32, u32)> {
    let caps = hours_window_re().captures(hours)?;
    let part = |i: usize| caps[i].parse::<u32>().ok();
    Some((part(1)? * 60 + part(2)?, part(3)? * 60 + part(4)?))
}

/// Checks `time` against the location's Monday-Friday window, inclusive at
/// both ends. Unknown locations and unparseable windows pass.
pub fn is_time_within_hours(time: &str, location: &str, kb: &KnowledgeBase) -> bool {
    let Some(minutes) = time_to_minutes(time) else {
        return false;
    };
    let Some(loc) = kb.find_location(location) else {
        return true;
    };
    match parse_window(&loc.hours.mon_fri) {
        Some((start, end)) => start <= minutes && minutes <= end,
        None => true,
    }
}

pub fn valid_contact(value: &str) -> bool {
    value.trim().chars().count() >= 3
}

/// Turns a raw answer into the canonical value for `field`. `location` is
/// the location the time must fall within, if one is known.
pub fn validate(
    field: Field,
    raw: &str,
    location: Option<&str>,
    kb: &KnowledgeBase,
) -> Result<String, FieldError> {
    let value = raw.trim();
    match field {
        Field::Service => find_service(value, kb).ok_or(FieldError::UnknownService),
        Field::Location => find_location(value, kb).ok_or(FieldError::UnknownLocation),
        Field::Date => {
            if valid_date(value) {
                Ok(value.to_string())
            } else {
                Err(FieldError::InvalidDate)
            }
        }
        Field::Time => {
            let time = extract_time(value).ok_or(FieldError::InvalidTime)?;
            match location {
                Some(loc) if !loc.trim().is_empty() && !is_time_within_hours(&time, loc, kb) => {
                    Err(FieldError::OutsideHours)
                }
                _ => Ok(time),
            }
        }
        Field::Contact => {
            if valid_contact(value) {
                Ok(value.to_string())
            } else {
                Err(FieldError::InvalidContact)
            }
        }
    }
}
