//! MongoDB-backed conversation store.

use super::{ConversationStore, SESSION_ENDED_MARKER};
use crate::models::{ChatMessage, MessageRole, Session};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use support_core::error::AppError;

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for support-service");
        let sessions = self.sessions();

        // Unique index on session_id
        let session_id_index = IndexModel::builder()
            .keys(doc! { "session_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("session_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        sessions
            .create_index(session_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create session_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        // Index on user_id for per-owner listings
        let user_id_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_id_idx".to_string())
                    .build(),
            )
            .build();

        sessions
            .create_index(user_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        // Index on updated_at for newest-first listings
        let updated_at_index = IndexModel::builder()
            .keys(doc! { "updated_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("updated_at_idx".to_string())
                    .build(),
            )
            .build();

        sessions
            .create_index(updated_at_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create updated_at index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    fn sessions(&self) -> Collection<Session> {
        self.db.collection("sessions")
    }

    /// Push a message in one update and return the post-image, so the append
    /// is visible to the read that follows it in the same request.
    async fn push_message(
        &self,
        session_id: &str,
        role: MessageRole,
        text: &str,
        mark_ended: bool,
    ) -> Result<Session, AppError> {
        let message = ChatMessage {
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        };

        let message_doc = mongodb::bson::to_document(&message).map_err(|e| {
            tracing::error!("Failed to serialize message: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let mut set = doc! { "updated_at": Utc::now().timestamp_millis() };
        if mark_ended {
            set.insert("ended", true);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .sessions()
            .find_one_and_update(
                doc! { "session_id": session_id },
                doc! {
                    "$push": { "messages": message_doc },
                    "$inc": { "message_count": 1 },
                    "$set": set
                },
                options,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to append message to session: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        updated.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))
    }
}

#[async_trait]
impl ConversationStore for MongoStore {
    async fn create_session(&self, user_id: Option<&str>) -> Result<Session, AppError> {
        let session = Session::new(user_id.map(str::to_string));
        self.sessions()
            .insert_one(&session, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert session: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(session)
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Session, AppError> {
        self.push_message(session_id, role, text, false).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Session, AppError> {
        self.sessions()
            .find_one(doc! { "session_id": session_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find session: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>, AppError> {
        let filter = doc! {
            "user_id": user_id,
            "message_count": { "$gt": 0 }
        };
        let options = FindOptions::builder()
            .sort(doc! { "updated_at": -1 })
            .build();

        let cursor = self.sessions().find(filter, options).await.map_err(|e| {
            tracing::error!("Failed to query sessions: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let sessions: Vec<Session> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect sessions: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        Ok(sessions)
    }

    async fn end_session(&self, session_id: &str) -> Result<Session, AppError> {
        self.push_message(session_id, MessageRole::System, SESSION_ENDED_MARKER, true)
            .await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}
