//! Reply generation with fallback.
//!
//! Provider failures never propagate: the chat must always receive some
//! reply. Which branch produced the text is kept as an explicit tag so
//! callers and tests can tell a real answer from a fallback.

use crate::services::context::ContextMessage;
use crate::services::providers::CompletionProvider;
use serde_json::json;
use std::sync::Arc;

/// Fixed system instruction prepended to every prompt.
pub const SUPPORT_INSTRUCTIONS: &str = "You are a customer support assistant. \
Answer the customer's question concisely and accurately using the conversation \
so far. If the request needs account changes, refunds, or anything you can't \
resolve yourself, say that you will escalate to a human agent.";

/// Returned when the provider answered but the payload had no usable text.
/// Deliberately contains an escalation phrase so these turns reach a human.
const UNUSABLE_ANSWER_FALLBACK: &str =
    "I'm unable to produce a useful answer right now. Please try again, or ask \
to be connected with a support agent.";

/// Returned when the provider call itself failed (timeout, non-2xx, network).
const DEGRADED_SERVICE_FALLBACK: &str =
    "I'm having trouble reaching the AI service right now. Please try again in a moment.";

/// Which branch produced a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// The provider returned usable text.
    Provider,
    /// A fixed fallback was substituted; the cause is kept for diagnostics.
    Fallback(String),
}

/// A generated reply before it is accepted as an assistant message.
#[derive(Debug)]
pub struct GeneratedReply {
    /// Trimmed, non-empty reply text.
    pub text: String,
    /// Raw provider payload, or the captured error for fallback replies.
    pub raw: serde_json::Value,
    pub source: ReplySource,
}

impl GeneratedReply {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ReplySource::Fallback(_))
    }
}

#[derive(Clone)]
pub struct ReplyGenerator {
    provider: Arc<dyn CompletionProvider>,
    instructions: String,
}

impl ReplyGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            instructions: SUPPORT_INSTRUCTIONS.to_string(),
        }
    }

    /// One prompt string: instructions, then the windowed history with each
    /// turn prefixed by its role, then the new utterance.
    fn build_prompt(&self, context: &[ContextMessage], user_text: &str) -> String {
        let mut prompt = String::with_capacity(self.instructions.len() + user_text.len() + 64);
        prompt.push_str(&self.instructions);
        if !context.is_empty() {
            prompt.push_str("\n\nConversation so far:\n");
            for message in context {
                prompt.push_str(message.role.as_str());
                prompt.push_str(": ");
                prompt.push_str(&message.text);
                prompt.push('\n');
            }
        }
        prompt.push_str("\nuser: ");
        prompt.push_str(user_text);
        prompt.push_str("\nassistant:");
        prompt
    }

    /// Generate a reply. Never fails: provider errors and unusable payloads
    /// degrade to fixed fallback texts with the cause captured in `raw`.
    pub async fn generate(&self, context: &[ContextMessage], user_text: &str) -> GeneratedReply {
        let prompt = self.build_prompt(context, user_text);

        match self.provider.complete(&prompt).await {
            Ok(response) => {
                let text = response
                    .text
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty());

                match text {
                    Some(text) => GeneratedReply {
                        text: text.to_string(),
                        raw: response.raw,
                        source: ReplySource::Provider,
                    },
                    None => {
                        tracing::warn!("Provider payload had no usable text, using fallback");
                        GeneratedReply {
                            text: UNUSABLE_ANSWER_FALLBACK.to_string(),
                            raw: response.raw,
                            source: ReplySource::Fallback(
                                "provider payload had no usable text".to_string(),
                            ),
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider call failed, using fallback");
                GeneratedReply {
                    text: DEGRADED_SERVICE_FALLBACK.to_string(),
                    raw: json!({ "error": e.to_string() }),
                    source: ReplySource::Fallback(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;
    use crate::services::providers::MockCompletionProvider;

    #[tokio::test]
    async fn provider_text_is_trimmed_and_tagged() {
        let provider = Arc::new(MockCompletionProvider::with_reply(
            "  Your order ships tomorrow.  ",
        ));
        let generator = ReplyGenerator::new(provider);

        let reply = generator.generate(&[], "Where is my order?").await;

        assert_eq!(reply.text, "Your order ships tomorrow.");
        assert_eq!(reply.source, ReplySource::Provider);
        assert!(!reply.is_fallback());
    }

    #[tokio::test]
    async fn missing_text_degrades_to_fallback() {
        let provider = Arc::new(MockCompletionProvider::without_text());
        let generator = ReplyGenerator::new(provider);

        let reply = generator.generate(&[], "hello").await;

        assert!(reply.is_fallback());
        assert!(!reply.text.is_empty());
        assert_eq!(reply.raw, serde_json::json!({ "candidates": [] }));
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_fallback_with_cause() {
        let provider = Arc::new(MockCompletionProvider::failing());
        let generator = ReplyGenerator::new(provider);

        let reply = generator.generate(&[], "hello").await;

        assert!(!reply.text.is_empty());
        match &reply.source {
            ReplySource::Fallback(cause) => assert!(cause.contains("mock network failure")),
            other => panic!("expected fallback, got {:?}", other),
        }
        assert!(reply.raw["error"].as_str().unwrap().contains("network"));
    }

    #[tokio::test]
    async fn prompt_includes_context_and_utterance_by_role() {
        let provider = Arc::new(MockCompletionProvider::default());
        let generator = ReplyGenerator::new(provider.clone());

        let context = vec![
            ContextMessage {
                role: MessageRole::User,
                text: "My tracking link is broken".to_string(),
            },
            ContextMessage {
                role: MessageRole::Assistant,
                text: "Let me look into that".to_string(),
            },
        ];

        generator.generate(&context, "Any update?").await;

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        let prompt = &prompts[0];
        assert!(prompt.contains("user: My tracking link is broken"));
        assert!(prompt.contains("assistant: Let me look into that"));
        assert!(prompt.contains("user: Any update?"));
        assert!(prompt.starts_with(SUPPORT_INSTRUCTIONS));
    }
}
