use chrono::Utc;
use serde::Deserialize;

use crate::models::{Booking, Field, KnowledgeBase};
use crate::services::validation::{self, FieldError};

/// Requested changes to a finalized booking. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingEdits {
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
}

impl BookingEdits {
    /// Location comes before time so the time is checked against the new
    /// location.
    fn in_apply_order(&self) -> [(Field, Option<&str>); 5] {
        [
            (Field::Service, self.service.as_deref()),
            (Field::Location, self.location.as_deref()),
            (Field::Date, self.date.as_deref()),
            (Field::Time, self.time.as_deref()),
            (Field::Contact, self.contact.as_deref()),
        ]
    }
}

/// Validates every edit and applies all of them, or none. Only `details`
/// and `updated_at` change.
pub fn apply_edits(
    booking: &mut Booking,
    edits: &BookingEdits,
    kb: &KnowledgeBase,
) -> Result<(), FieldError> {
    let mut details = booking.details.clone();

    for (field, raw) in edits.in_apply_order() {
        let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let location = details.get(&Field::Location).cloned();
        let value = validation::validate(field, raw, location.as_deref(), kb)?;
        details.insert(field, value);
    }

    booking.details = details;
    booking.updated_at = Utc::now();
    Ok(())
}
