//! Conversation storage.
//!
//! The engine never touches a concrete store directly; it goes through the
//! [`ConversationStore`] trait so the Mongo-backed store and the in-memory
//! store (tests, fully local deployments) are interchangeable.

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::models::{MessageRole, Session};
use async_trait::async_trait;
use support_core::error::AppError;

/// Text of the terminal marker appended by `end_session`.
pub const SESSION_ENDED_MARKER: &str = "Session ended by user.";

/// Durable record of sessions and their ordered messages.
///
/// Appends are atomic per call and visible to the immediately following read.
/// No cross-call mutual exclusion is provided: concurrent sends to the same
/// session may interleave, and callers are expected to keep at most one turn
/// in flight per session.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a session with empty history.
    async fn create_session(&self, user_id: Option<&str>) -> Result<Session, AppError>;

    /// Append a message and return the updated session.
    /// Fails with `NotFound` if the session id is unknown.
    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Session, AppError>;

    /// Fetch a session. Fails with `NotFound` if absent.
    async fn get_session(&self, session_id: &str) -> Result<Session, AppError>;

    /// List an owner's sessions, newest first. Sessions with no messages are
    /// considered abandoned and hidden.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>, AppError>;

    /// Append the terminal marker message. Fails with `NotFound` if absent.
    /// Ending an already-ended session appends another marker.
    async fn end_session(&self, session_id: &str) -> Result<Session, AppError>;

    /// Connectivity probe for readiness endpoints.
    async fn health_check(&self) -> Result<(), AppError>;
}
