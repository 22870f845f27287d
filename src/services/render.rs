use std::collections::BTreeMap;

use crate::models::{Booking, BookingStatus, Draft, Field, KnowledgeBase};

pub const OPENING_QUESTION: &str = "What service would you like to book?";

pub fn question_for(field: Field, kb: &KnowledgeBase) -> String {
    match field {
        Field::Service => with_options(OPENING_QUESTION, &kb.service_names()),
        Field::Location => with_options("Which location do you prefer?", &kb.location_names()),
        Field::Date => "What date would you like? (e.g., 21 Dec)".to_string(),
        Field::Time => "What time works for you? (e.g., 10:30 AM)".to_string(),
        Field::Contact => "What contact should we use? (name and phone/email)".to_string(),
    }
}

fn with_options(question: &str, options: &[&str]) -> String {
    if options.is_empty() {
        question.to_string()
    } else {
        format!("{question} Options: {}", options.join(", "))
    }
}

fn format_details(
    booking_type: &str,
    details: &BTreeMap<Field, String>,
    status: BookingStatus,
) -> String {
    let mut lines = vec![format!("**Booking type:** {booking_type}")];
    lines.extend(
        details
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| format!("**{k}:** {v}")),
    );
    lines.push(format!("**status:** {}", status.as_str()));
    lines.join("\n")
}

pub fn format_draft(draft: &Draft) -> String {
    format_details(&draft.booking_type, &draft.details, draft.status)
}

pub fn format_booking(booking: &Booking) -> String {
    format_details(&booking.booking_type, &booking.details, booking.status)
}

pub fn confirmation_prompt(summary: &str) -> String {
    format!("Please confirm your booking details (yes/no):\n{summary}")
}

/// Human-readable clinic overview for info requests.
pub fn kb_summary(kb: &KnowledgeBase) -> String {
    let mut lines = Vec::new();
    if !kb.clinic_name.is_empty() {
        lines.push(format!("Clinic: {}", kb.clinic_name));
    }
    if !kb.services.is_empty() {
        lines.push("Services:".to_string());
        for s in &kb.services {
            let mut bits = vec![s.name.clone()];
            if s.duration_minutes > 0 {
                bits.push(format!("{} min", s.duration_minutes));
            }
            bits.push(format!("SGD {}", s.price));
            lines.push(format!(" - {}", bits.join(" | ")));
        }
    }
    if !kb.locations.is_empty() {
        lines.push("Locations and Hours:".to_string());
        for l in &kb.locations {
            lines.push(format!(" - {}: {}", l.name, l.address));
            lines.push(format!("   Mon-Fri: {}", or_na(&l.hours.mon_fri)));
            lines.push(format!("   Sat: {}", or_na(&l.hours.sat)));
            lines.push(format!("   Sun: {}", or_na(&l.hours.sun)));
        }
    }
    if let Some(policy) = &kb.time_policy {
        lines.push(format!("Time policy: {policy}"));
    }
    if let Some(policy) = &kb.date_policy {
        lines.push(format!("Date policy: {policy}"));
    }

    if lines.is_empty() {
        "No clinic info available.".to_string()
    } else {
        lines.join("\n")
    }
}

fn or_na(s: &str) -> &str {
    if s.trim().is_empty() {
        "n/a"
    } else {
        s
    }
}
