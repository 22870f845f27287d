use std::sync::OnceLock;

use regex::Regex;

use crate::models::Field;

/// Coarse keyword classes. A message can belong to several at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    InfoRequest,
    BookingRelated,
    Confirm,
    /// "yes" to a single pending field value.
    Affirm,
    /// "no" to a single pending field value.
    Decline,
    StatusLookup,
    /// Names one of the booking fields.
    FieldMention,
}

const INTENT_PATTERNS: &[(Intent, &str)] = &[
    (
        Intent::InfoRequest,
        r"(?i)\b(services|service list|opening hours|hours|locations|price|pricing|clinic info|clinic information)\b",
    ),
    (
        Intent::BookingRelated,
        r"(?i)\b(book|booking|appointment|schedule|reschedule|cancel|change|edit)\b",
    ),
    (Intent::Confirm, r"(?i)\b(confirm|confirmed|yes|okay|ok|sure)\b"),
    (Intent::Affirm, r"(?i)\b(yes|confirm|ok|okay|sure)\b"),
    (Intent::Decline, r"(?i)\b(no|change|edit|wrong)\b"),
    (
        Intent::StatusLookup,
        r"(?i)\b(my booking|booking details|booking status|what did i book)\b",
    ),
    (Intent::FieldMention, r"(?i)\b(service|date|time|location|contact)\b"),
];

fn patterns() -> &'static [(Intent, Regex)] {
    static PATTERNS: OnceLock<Vec<(Intent, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        INTENT_PATTERNS
            .iter()
            .map(|(intent, pattern)| {
                (*intent, Regex::new(pattern).expect("intent pattern must compile"))
            })
            .collect()
    })
}

fn pattern(intent: Intent) -> Option<&'static Regex> {
    patterns()
        .iter()
        .find(|(i, _)| *i == intent)
        .map(|(_, re)| re)
}

pub fn matches(intent: Intent, text: &str) -> bool {
    pattern(intent).is_some_and(|re| re.is_match(text))
}

/// All classes `text` belongs to, in table order.
pub fn classify(text: &str) -> Vec<Intent> {
    patterns()
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(intent, _)| *intent)
        .collect()
}

pub fn is_info_request(text: &str) -> bool {
    matches(Intent::InfoRequest, text)
}

pub fn is_booking_related(text: &str) -> bool {
    matches(Intent::BookingRelated, text)
}

pub fn is_confirm_intent(text: &str) -> bool {
    matches(Intent::Confirm, text)
}

/// The first booking field named in `text`, e.g. "change the time".
pub fn mentioned_field(text: &str) -> Option<Field> {
    pattern(Intent::FieldMention)?
        .find(text)
        .and_then(|m| Field::parse(m.as_str()))
}
