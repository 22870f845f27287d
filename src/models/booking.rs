use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::{Draft, Field};

/// A finalized appointment. `id` and `created_at` never change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub booking_type: String,
    pub details: BTreeMap<Field, String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmation_summary: String,
}

impl Booking {
    pub fn finalize(draft: &Draft, confirmation_summary: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            booking_type: draft.booking_type.clone(),
            details: draft.details.clone(),
            status: BookingStatus::Booked,
            created_at: now,
            updated_at: now,
            confirmation_summary: confirmation_summary.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Draft,
    Booked,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Draft => "draft",
            BookingStatus::Booked => "booked",
        }
    }
}
