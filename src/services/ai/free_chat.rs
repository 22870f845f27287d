use anyhow::Context;

use crate::services::ai::{LlmProvider, Message};
use crate::services::dialogue::FreeChatRequest;

pub const EMPTY_REPLY: &str = "Sorry, I do not have that.";

/// Sends the free-chat payload as a single JSON user message.
pub async fn answer(llm: &dyn LlmProvider, request: &FreeChatRequest) -> anyhow::Result<String> {
    let payload =
        serde_json::to_string(request).context("failed to serialize free-chat payload")?;
    let messages = [Message::user(payload)];

    let reply = llm.chat(request.system_prompt, &messages).await?;
    let reply = reply.trim();
    if reply.is_empty() {
        tracing::warn!("language model returned an empty reply");
        return Ok(EMPTY_REPLY.to_string());
    }
    Ok(reply.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{Draft, KnowledgeBase};
    use crate::services::dialogue::FREE_CHAT_PROMPT;

    struct RecordingLlm {
        reply: String,
        seen: Mutex<Vec<(String, Vec<Message>)>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), messages.to_vec()));
            Ok(self.reply.clone())
        }
    }

    fn request() -> FreeChatRequest {
        FreeChatRequest {
            system_prompt: FREE_CHAT_PROMPT,
            user_message: "do you take walk-ins?".to_string(),
            clinic_kb: KnowledgeBase::default_clinic(),
            current_booking: Draft::new(),
        }
    }

    #[tokio::test]
    async fn test_sends_json_payload() {
        let llm = RecordingLlm {
            reply: " We do! \n".to_string(),
            seen: Mutex::new(vec![]),
        };
        let reply = answer(&llm, &request()).await.unwrap();
        assert_eq!(reply, "We do!");

        let seen = llm.seen.lock().unwrap();
        let (system, messages) = &seen[0];
        assert_eq!(system, FREE_CHAT_PROMPT);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        let payload: serde_json::Value = serde_json::from_str(&messages[0].content).unwrap();
        assert_eq!(payload["user_message"], "do you take walk-ins?");
        assert_eq!(payload["clinic_kb"]["services"][1]["name"], "Dental Cleaning");
        assert_eq!(payload["current_booking"]["booking_type"], "appointment");
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let llm = RecordingLlm {
            reply: "   ".to_string(),
            seen: Mutex::new(vec![]),
        };
        assert_eq!(answer(&llm, &request()).await.unwrap(), EMPTY_REPLY);
    }
}
