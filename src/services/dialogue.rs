//! Slot-filling dialogue for draft bookings.
//!
//! [`process`] takes a session and the user's message and returns the reply
//! together with the updated session. It never touches storage or the
//! network: a free-chat turn is handed back to the caller as a
//! [`FreeChatRequest`].

use serde::Serialize;

use crate::models::{Booking, Draft, DraftStage, Field, KnowledgeBase, Session};
use crate::services::intent::{self, Intent};
use crate::services::matcher;
use crate::services::render;
use crate::services::validation::{self, FieldError};

pub const FREE_CHAT_PROMPT: &str = "You are a helpful assistant. Answer the user's question. \
If they ask about the clinic or booking data, use the provided JSON.\nBe concise and clear.";

/// Payload for the language-model fallback.
#[derive(Debug, Clone, Serialize)]
pub struct FreeChatRequest {
    #[serde(skip)]
    pub system_prompt: &'static str,
    pub user_message: String,
    pub clinic_kb: KnowledgeBase,
    pub current_booking: Draft,
}

#[derive(Debug)]
pub enum Turn {
    Reply { reply: String, session: Session },
    FreeChat { request: FreeChatRequest, session: Session },
}

enum Decision {
    Reply(String),
    FreeChat,
}

pub fn process(mut session: Session, message: &str, kb: &KnowledgeBase) -> Turn {
    let text = message.trim();
    let before = session.draft.stage.as_str();
    let (branch, decision) = decide(&mut session, text, kb);

    tracing::debug!(
        branch,
        intents = ?intent::classify(text),
        from = before,
        to = session.draft.stage.as_str(),
        "dialogue step"
    );

    match decision {
        Decision::Reply(reply) => Turn::Reply { reply, session },
        Decision::FreeChat => Turn::FreeChat {
            request: FreeChatRequest {
                system_prompt: FREE_CHAT_PROMPT,
                user_message: text.to_string(),
                clinic_kb: kb.clone(),
                current_booking: session.draft.clone(),
            },
            session,
        },
    }
}

/// Branch order matters: the first branch that answers wins.
fn decide(session: &mut Session, text: &str, kb: &KnowledgeBase) -> (&'static str, Decision) {
    if let Some(reply) = infer_service(&mut session.draft, text, kb) {
        return ("infer_service", Decision::Reply(reply));
    }
    if let Some(reply) = resolve_pending(&mut session.draft, text, kb) {
        return ("pending_confirm", Decision::Reply(reply));
    }
    if let Some(reply) = resolve_full_confirmation(session, text, kb) {
        return ("full_confirm", Decision::Reply(reply));
    }
    if let Some(reply) = capture_field(&mut session.draft, text, kb) {
        return ("capture_field", Decision::Reply(reply));
    }
    if intent::matches(Intent::StatusLookup, text) {
        let reply = match session.latest_booking() {
            Some(booking) => render::format_booking(booking),
            None => "No bookings yet. Want to make one?".to_string(),
        };
        return ("status_lookup", Decision::Reply(reply));
    }
    if intent::is_info_request(text) {
        return ("info_lookup", Decision::Reply(render::kb_summary(kb)));
    }

    let draft = &mut session.draft;
    if !intent::is_booking_related(text)
        && draft.last_field().is_none()
        && !draft.awaiting_confirmation()
        && !intent::is_confirm_intent(text)
    {
        return ("free_chat", Decision::FreeChat);
    }

    let reply = match draft.stage.clone() {
        DraftStage::PendingConfirm { field, value } => {
            format!("Please reply yes or no. Confirm {field}: {value}?")
        }
        DraftStage::AwaitingFullConfirm { summary } => render::confirmation_prompt(&summary),
        DraftStage::AwaitingValue { field } => render::question_for(field, kb),
        DraftStage::Idle => advance(draft, kb),
    };
    ("elicit", Decision::Reply(reply))
}

/// Moves an unblocked draft on: ask for the next missing field, or for the
/// whole booking once nothing is missing.
fn advance(draft: &mut Draft, kb: &KnowledgeBase) -> String {
    match draft.missing_fields().first() {
        Some(&field) => {
            draft.stage = DraftStage::AwaitingValue { field };
            render::question_for(field, kb)
        }
        None => {
            let summary = render::format_draft(draft);
            let reply = render::confirmation_prompt(&summary);
            draft.stage = DraftStage::AwaitingFullConfirm { summary };
            reply
        }
    }
}

fn suggest(draft: &mut Draft, field: Field, value: &str) {
    draft.stage = DraftStage::PendingConfirm {
        field,
        value: value.to_string(),
    };
    draft.touch();
}

fn infer_service(draft: &mut Draft, text: &str, kb: &KnowledgeBase) -> Option<String> {
    if draft.has(Field::Service) || intent::is_info_request(text) {
        return None;
    }
    let service = matcher::infer_service(text, kb)?;
    suggest(draft, Field::Service, service);
    Some(format!("Did you want to book **{service}**? (yes/no)"))
}

fn resolve_pending(draft: &mut Draft, text: &str, kb: &KnowledgeBase) -> Option<String> {
    let DraftStage::PendingConfirm { field, value } = draft.stage.clone() else {
        return None;
    };

    // A "no" anywhere outweighs a "yes": "no, not ok" rejects.
    if intent::matches(Intent::Decline, text) {
        draft.stage = DraftStage::AwaitingValue { field };
        return Some(render::question_for(field, kb));
    }
    if intent::matches(Intent::Affirm, text) {
        draft.details.insert(field, value);
        draft.stage = DraftStage::Idle;
        draft.touch();
        return Some(advance(draft, kb));
    }
    None
}

fn resolve_full_confirmation(
    session: &mut Session,
    text: &str,
    kb: &KnowledgeBase,
) -> Option<String> {
    let DraftStage::AwaitingFullConfirm { summary } = session.draft.stage.clone() else {
        return None;
    };

    let declined = intent::matches(Intent::Decline, text);
    if intent::is_confirm_intent(text) && !declined {
        let booking = Booking::finalize(&session.draft, &summary);
        let reply = format!(
            "Your booking is confirmed. Booking ID: {}\n{}",
            booking.id,
            render::format_booking(&booking)
        );
        tracing::info!(booking_id = %booking.id, "booking finalized");
        session.bookings.push(booking);
        session.draft = Draft::new();
        return Some(reply);
    }

    if let Some(field) = intent::mentioned_field(text) {
        let asked_for_change = declined
            || intent::is_booking_related(text)
            || Field::parse(text) == Some(field);
        if asked_for_change {
            let draft = &mut session.draft;
            draft.details.remove(&field);
            draft.stage = DraftStage::AwaitingValue { field };
            draft.touch();
            return Some(render::question_for(field, kb));
        }
    }
    if declined {
        return Some(
            "Which detail would you like to change? (service, date, time, location, contact)"
                .to_string(),
        );
    }
    None
}

fn capture_field(draft: &mut Draft, text: &str, kb: &KnowledgeBase) -> Option<String> {
    let field = draft.last_field()?;
    if intent::is_info_request(text) {
        return None;
    }

    let location = draft.get(Field::Location).map(str::to_string);
    let reply = match validation::validate(field, text, location.as_deref(), kb) {
        Ok(value) => {
            let reply = format!("Got it. Please confirm {field}: {value} (yes/no)");
            suggest(draft, field, &value);
            reply
        }
        Err(err @ (FieldError::UnknownService | FieldError::UnknownLocation)) => {
            let suggestion = match field {
                Field::Service => matcher::fuzzy_service(text, kb),
                _ => matcher::fuzzy_location(text, kb),
            };
            match suggestion {
                Some(s) => {
                    suggest(draft, field, s);
                    format!("Did you mean {s}? (yes/no)")
                }
                None => err.reprompt().to_string(),
            }
        }
        Err(err) => {
            tracing::debug!(%field, error = %err, "rejected field answer");
            err.reprompt().to_string()
        }
    };
    Some(reply)
}
