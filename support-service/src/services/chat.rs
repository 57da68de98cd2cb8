//! Session orchestration.
//!
//! Composes the store, context builder, reply generator, and escalation
//! classifier into the operations the HTTP surface exposes. Only the reply
//! generator masks its own failures; validation and store errors propagate.

use crate::models::{MessageRole, Session};
use crate::services::context::build_context;
use crate::services::escalation::needs_escalation;
use crate::services::reply::ReplyGenerator;
use crate::services::store::ConversationStore;
use std::sync::Arc;
use support_core::error::AppError;

/// Longest owner reference accepted from the identity provider.
const MAX_OWNER_REFERENCE_LEN: usize = 128;

/// Outcome of one completed turn.
#[derive(Debug)]
pub struct TurnReply {
    /// Assistant reply text (possibly a fallback, never empty).
    pub text: String,
    /// Whether the reply suggests handing off to a human agent.
    pub escalation: bool,
    /// True when the text came from the fallback branch.
    pub fallback: bool,
    /// Raw provider payload or captured error, for diagnostics.
    pub raw: serde_json::Value,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    generator: ReplyGenerator,
}

impl ChatService {
    pub fn new(store: Arc<dyn ConversationStore>, generator: ReplyGenerator) -> Self {
        Self { store, generator }
    }

    /// Create a session, optionally owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn create_session(&self, user_id: Option<&str>) -> Result<Session, AppError> {
        if let Some(owner) = user_id {
            validate_owner_reference(owner)?;
        }
        let session = self.store.create_session(user_id).await?;
        tracing::info!(session_id = %session.session_id, "Created session");
        Ok(session)
    }

    /// Process one user turn.
    ///
    /// The user message is durably appended before the model is invoked, so
    /// a crash mid-reply loses at most the assistant's answer, never the
    /// user's turn.
    #[tracing::instrument(skip(self, text), fields(session_id = %session_id))]
    pub async fn send_turn(&self, session_id: &str, text: &str) -> Result<TurnReply, AppError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Message content is required"
            )));
        }

        let session = self
            .store
            .append_message(session_id, MessageRole::User, trimmed)
            .await?;

        // The appended utterance is handed to the generator separately, so
        // the context window covers only the history before it.
        let history = &session.messages[..session.messages.len().saturating_sub(1)];
        let context = build_context(history);

        let generated = self.generator.generate(&context, trimmed).await;
        let escalation = needs_escalation(&generated.text);

        self.store
            .append_message(session_id, MessageRole::Assistant, &generated.text)
            .await?;

        tracing::info!(
            escalation,
            fallback = generated.is_fallback(),
            reply_len = generated.text.len(),
            "Turn completed"
        );

        Ok(TurnReply {
            escalation,
            fallback: generated.is_fallback(),
            text: generated.text,
            raw: generated.raw,
        })
    }

    /// Fetch a session with its full history.
    pub async fn fetch_session(&self, session_id: &str) -> Result<Session, AppError> {
        self.store.get_session(session_id).await
    }

    /// List an owner's sessions, newest first.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>, AppError> {
        validate_owner_reference(user_id)?;
        self.store.list_sessions(user_id).await
    }

    /// End a session by appending the terminal marker.
    #[tracing::instrument(skip(self))]
    pub async fn end_session(&self, session_id: &str) -> Result<Session, AppError> {
        let session = self.store.end_session(session_id).await?;
        tracing::info!(session_id = %session.session_id, "Ended session");
        Ok(session)
    }
}

/// The identity provider is the authority on owner ids; this only rejects
/// values too malformed to reference a user at all.
fn validate_owner_reference(owner: &str) -> Result<(), AppError> {
    if owner.trim().is_empty()
        || owner.len() > MAX_OWNER_REFERENCE_LEN
        || owner.chars().any(char::is_whitespace)
    {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid user reference"
        )));
    }
    Ok(())
}
