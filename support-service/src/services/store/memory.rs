//! In-memory conversation store.
//!
//! Backs tests and fully local deployments. Same trait semantics as the
//! Mongo store, minus durability: state dies with the process.

use super::{ConversationStore, SESSION_ENDED_MARKER};
use crate::models::{MessageRole, Session};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use support_core::error::AppError;

#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create_session(&self, user_id: Option<&str>) -> Result<Session, AppError> {
        let session = Session::new(user_id.map(str::to_string));
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Session, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;
        session.add_message(role, text.to_string());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &str) -> Result<Session, AppError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>, AppError> {
        let sessions = self.sessions.read().await;
        let mut owned: Vec<Session> = sessions
            .values()
            .filter(|s| s.user_id.as_deref() == Some(user_id) && s.message_count > 0)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn end_session(&self, session_id: &str) -> Result<Session, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;
        session.add_message(MessageRole::System, SESSION_ENDED_MARKER.to_string());
        session.ended = true;
        Ok(session.clone())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
