//! Context-window construction.

use crate::models::{ChatMessage, MessageRole};

/// Fixed number of trailing messages sent to the completion provider.
/// Older history is dropped, not summarized.
pub const CONTEXT_WINDOW_MESSAGES: usize = 20;

/// A history entry projected down to what the provider needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMessage {
    pub role: MessageRole,
    pub text: String,
}

/// Project the last [`CONTEXT_WINDOW_MESSAGES`] messages, in original order.
/// Empty history yields an empty context, which is valid provider input.
pub fn build_context(messages: &[ChatMessage]) -> Vec<ContextMessage> {
    let skip = messages.len().saturating_sub(CONTEXT_WINDOW_MESSAGES);
    messages[skip..]
        .iter()
        .map(|m| ContextMessage {
            role: m.role,
            text: m.text.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(i: usize) -> ChatMessage {
        ChatMessage {
            role: if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            },
            text: format!("message {}", i),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_history_yields_empty_context() {
        assert!(build_context(&[]).is_empty());
    }

    #[test]
    fn short_history_is_returned_whole() {
        let messages: Vec<ChatMessage> = (0..5).map(message).collect();
        let context = build_context(&messages);
        assert_eq!(context.len(), 5);
        assert_eq!(context[0].text, "message 0");
        assert_eq!(context[4].text, "message 4");
    }

    #[test]
    fn long_history_is_capped_at_the_window() {
        let messages: Vec<ChatMessage> = (0..53).map(message).collect();
        let context = build_context(&messages);
        assert_eq!(context.len(), CONTEXT_WINDOW_MESSAGES);
        // The most recent messages survive, in original order.
        assert_eq!(context[0].text, "message 33");
        assert_eq!(context[19].text, "message 52");
    }

    #[test]
    fn exactly_window_sized_history_is_untouched() {
        let messages: Vec<ChatMessage> = (0..CONTEXT_WINDOW_MESSAGES).map(message).collect();
        assert_eq!(build_context(&messages).len(), CONTEXT_WINDOW_MESSAGES);
    }
}
