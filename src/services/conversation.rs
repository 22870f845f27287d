use std::sync::Arc;

use crate::db::queries;
use crate::models::Session;
use crate::services::ai::free_chat;
use crate::services::dialogue::{self, Turn};
use crate::state::AppState;

pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble right now. Please try again in a moment.";

#[derive(Debug)]
pub struct ChatOutcome {
    pub reply: String,
    pub session: Session,
}

/// Loads the session, runs one dialogue turn and saves the result.
pub async fn process_message(
    state: &Arc<AppState>,
    session_id: &str,
    message: &str,
) -> anyhow::Result<ChatOutcome> {
    let lock = state.session_lock(session_id)?;
    let _guard = lock.lock().await;

    let session = state.with_db(|db| queries::load_session(db, session_id))?;

    tracing::info!(
        session_id,
        stage = session.draft.stage.as_str(),
        "processing message"
    );

    let (reply, session) = match dialogue::process(session, message, &state.kb) {
        Turn::Reply { reply, session } => (reply, session),
        Turn::FreeChat {
            request,
            mut session,
        } => match free_chat::answer(state.llm.as_ref(), &request).await {
            Ok(reply) => {
                session.record_exchange(&request.user_message, &reply);
                (reply, session)
            }
            Err(e) => {
                tracing::error!(error = %e, session_id, "free chat failed");
                (FALLBACK_REPLY.to_string(), session)
            }
        },
    };

    state.with_db(|db| queries::save_session(db, session_id, &session))?;

    Ok(ChatOutcome { reply, session })
}
