use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub name: String,
    pub duration_minutes: u32,
    #[serde(rename = "price_sgd")]
    pub price: u32,
}

/// Operating hours as free text, e.g. `"09:00-18:00"` or `"closed"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Hours {
    #[serde(default)]
    pub mon_fri: String,
    #[serde(default)]
    pub sat: String,
    #[serde(default)]
    pub sun: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub hours: Hours,
}

/// Static clinic reference data. Loaded once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub clinic_name: String,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_policy: Option<String>,
}

impl KnowledgeBase {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let kb: KnowledgeBase = serde_json::from_str(s)?;
        if let Some(service) = kb.services.iter().find(|s| s.name.trim().is_empty()) {
            anyhow::bail!("service with blank name (duration {} min)", service.duration_minutes);
        }
        if let Some(location) = kb.locations.iter().find(|l| l.name.trim().is_empty()) {
            anyhow::bail!("location with blank name (address {:?})", location.address);
        }
        Ok(kb)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read knowledge base: {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("invalid knowledge base: {}", path.display()))
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services
            .iter()
            .map(|s| s.name.trim())
            .filter(|n| !n.is_empty())
            .collect()
    }

    pub fn location_names(&self) -> Vec<&str> {
        self.locations
            .iter()
            .map(|l| l.name.trim())
            .filter(|n| !n.is_empty())
            .collect()
    }

    pub fn find_location(&self, name: &str) -> Option<&Location> {
        let name = name.trim().to_lowercase();
        self.locations
            .iter()
            .find(|l| l.name.trim().to_lowercase() == name)
    }

    /// The built-in clinic used when no knowledge base file is configured.
    pub fn default_clinic() -> Self {
        let service = |name: &str, duration_minutes, price| Service {
            name: name.to_string(),
            duration_minutes,
            price,
        };
        let location = |name: &str, address: &str, mon_fri: &str, sat: &str| Location {
            name: name.to_string(),
            address: address.to_string(),
            hours: Hours {
                mon_fri: mon_fri.to_string(),
                sat: sat.to_string(),
                sun: "closed".to_string(),
            },
        };

        Self {
            clinic_name: "BookBot Clinic".to_string(),
            services: vec![
                service("General Consultation", 30, 60),
                service("Dental Cleaning", 45, 120),
                service("Physiotherapy", 60, 150),
                service("Vaccination", 15, 40),
            ],
            locations: vec![
                location(
                    "Raffles Place",
                    "1 Raffles Place, Singapore 048616",
                    "09:00-18:00",
                    "09:00-13:00",
                ),
                location(
                    "Orchard",
                    "200 Orchard Rd, Singapore 238852",
                    "10:00-19:00",
                    "10:00-14:00",
                ),
                location(
                    "Tampines",
                    "10 Tampines Central 1, Singapore 529536",
                    "09:00-18:30",
                    "09:00-13:00",
                ),
            ],
            time_policy: Some(
                "Appointments are scheduled in 15-minute increments within location hours."
                    .to_string(),
            ),
            date_policy: Some("Bookings allowed up to 60 days in advance.".to_string()),
        }
    }
}
