//! Application startup and lifecycle management.
//!
//! Builds the store and provider from configuration, wires the axum router,
//! and runs the HTTP server until a shutdown signal arrives.

use crate::config::{StoreBackend, SupportConfig};
use crate::handlers;
use crate::services::providers::{
    CompletionProvider, GeminiConfig, GeminiProvider, MockCompletionProvider,
};
use crate::services::store::{ConversationStore, MemoryStore, MongoStore};
use crate::services::{ChatService, ReplyGenerator};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use support_core::error::AppError;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: SupportConfig,
    pub store: Arc<dyn ConversationStore>,
    pub chat: ChatService,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: SupportConfig) -> Result<Self, AppError> {
        let store: Arc<dyn ConversationStore> = match config.chat.store_backend {
            StoreBackend::MongoDb => {
                let db = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;

                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;

                Arc::new(db)
            }
            StoreBackend::Memory => {
                tracing::info!("Using in-memory conversation store (non-durable)");
                Arc::new(MemoryStore::new())
            }
        };

        let provider: Arc<dyn CompletionProvider> = if config.chat.mock_provider {
            tracing::info!("Using mock completion provider");
            Arc::new(MockCompletionProvider::default())
        } else {
            let gemini_config = GeminiConfig {
                api_key: config.google.api_key.clone(),
                model: config.models.text_model.clone(),
            };
            let timeout = Duration::from_secs(config.chat.provider_timeout_secs);
            tracing::info!(
                model = %config.models.text_model,
                "Initialized Gemini completion provider"
            );
            Arc::new(GeminiProvider::new(gemini_config, timeout))
        };

        let chat = ChatService::new(store.clone(), ReplyGenerator::new(provider));

        let state = AppState {
            config: config.clone(),
            store,
            chat,
        };

        // Bind listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Support service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state)?;

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

fn build_router(state: AppState) -> std::io::Result<Router> {
    let allowed_origin = state
        .config
        .http
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            std::io::Error::other(format!(
                "Invalid SUPPORT_ALLOWED_ORIGIN '{}': {}",
                state.config.http.allowed_origin, e
            ))
        })?;

    // The browser client sends credentialed requests from a single origin.
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Ok(Router::new()
        .route("/api/session/new", post(handlers::session::create_session))
        .route("/api/session/chat", post(handlers::session::send_turn))
        .route(
            "/api/session/list/:user_id",
            get(handlers::session::list_sessions),
        )
        .route("/api/session/:id", get(handlers::session::get_session))
        .route("/api/session/:id/end", post(handlers::session::end_session))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
