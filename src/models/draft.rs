use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::BookingStatus;

/// A booking detail the engine collects from the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Service,
    Date,
    Time,
    Location,
    Contact,
}

impl Field {
    /// Elicitation order when several fields are missing.
    pub const REQUIRED: [Field; 5] = [
        Field::Service,
        Field::Date,
        Field::Time,
        Field::Location,
        Field::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Service => "service",
            Field::Date => "date",
            Field::Time => "time",
            Field::Location => "location",
            Field::Contact => "contact",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "service" => Some(Field::Service),
            "date" => Some(Field::Date),
            "time" => Some(Field::Time),
            "location" => Some(Field::Location),
            "contact" => Some(Field::Contact),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the engine is waiting for. Only one of these can be outstanding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum DraftStage {
    #[default]
    Idle,
    /// A free-text answer for `field`.
    AwaitingValue { field: Field },
    /// A yes/no on committing `value` into `field`.
    PendingConfirm { field: Field, value: String },
    /// A yes/no on the whole booking.
    AwaitingFullConfirm { summary: String },
}

impl DraftStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStage::Idle => "idle",
            DraftStage::AwaitingValue { .. } => "awaiting_value",
            DraftStage::PendingConfirm { .. } => "pending_confirm",
            DraftStage::AwaitingFullConfirm { .. } => "awaiting_full_confirm",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draft {
    pub booking_type: String,
    pub details: BTreeMap<Field, String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub stage: DraftStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}

impl Draft {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            booking_type: "appointment".to_string(),
            details: BTreeMap::new(),
            status: BookingStatus::Draft,
            stage: DraftStage::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.details
            .get(&field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn has(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    /// Required fields still unset, in elicitation order.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::REQUIRED
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }

    /// The field a free-text answer is expected for, if any.
    pub fn last_field(&self) -> Option<Field> {
        match self.stage {
            DraftStage::AwaitingValue { field } => Some(field),
            _ => None,
        }
    }

    pub fn awaiting_confirmation(&self) -> bool {
        matches!(self.stage, DraftStage::AwaitingFullConfirm { .. })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
