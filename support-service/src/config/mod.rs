use serde::Deserialize;
use std::env;
use support_core::config as core_config;
use support_core::error::AppError;

/// Default request timeout applied to completion provider calls. This is the
/// caller-side boundary on the only unbounded-latency operation in the engine.
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct SupportConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub models: ModelConfig,
    pub google: GoogleConfig,
    pub chat: ChatConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Completion model for support replies (e.g., gemini-2.0-flash)
    pub text_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Which conversation store backs the engine.
    pub store_backend: StoreBackend,
    /// Use the canned in-process provider instead of Gemini.
    pub mock_provider: bool,
    /// Request timeout for provider calls, in seconds.
    pub provider_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Browser origin allowed to call the API with credentials.
    pub allowed_origin: String,
}

/// Conversation store backend selection.
///
/// `Memory` is the non-durable local/test mode; `MongoDb` is production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "mongodb" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "SUPPORT_STORE_BACKEND must be 'mongodb' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

impl SupportConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(SupportConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("support_db"), is_prod)?,
            },
            models: ModelConfig {
                text_model: get_env("SUPPORT_TEXT_MODEL", Some("gemini-2.0-flash"), is_prod)?,
            },
            google: GoogleConfig {
                api_key: get_env("GOOGLE_API_KEY", None, is_prod)?,
            },
            chat: ChatConfig {
                store_backend: StoreBackend::parse(&get_env(
                    "SUPPORT_STORE_BACKEND",
                    Some("mongodb"),
                    is_prod,
                )?)?,
                mock_provider: get_env("SUPPORT_MOCK_PROVIDER", Some("false"), is_prod)?
                    .parse()
                    .unwrap_or(false),
                provider_timeout_secs: get_env(
                    "SUPPORT_PROVIDER_TIMEOUT_SECS",
                    Some(&DEFAULT_PROVIDER_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            },
            http: HttpConfig {
                allowed_origin: get_env(
                    "SUPPORT_ALLOWED_ORIGIN",
                    Some("http://localhost:5173"),
                    is_prod,
                )?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
