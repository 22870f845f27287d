use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::Booking;
use super::draft::Draft;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub user: String,
    pub assistant: String,
}

/// Everything stored under one session id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Session {
    #[serde(default)]
    pub draft: Draft,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Session {
    pub fn latest_booking(&self) -> Option<&Booking> {
        self.bookings.last()
    }

    pub fn find_booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn find_booking_mut(&mut self, id: &str) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    pub fn remove_booking(&mut self, id: &str) -> bool {
        let before = self.bookings.len();
        self.bookings.retain(|b| b.id != id);
        self.bookings.len() != before
    }

    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.history.push(HistoryEntry {
            at: Utc::now(),
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
    }
}
