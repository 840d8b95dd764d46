//! Application configuration loaded from environment variables.
//!
//! A `.env` file is read first when present, so local development needs no
//! exported variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Where group state is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// JSON snapshot file; `None` keeps everything in memory.
    Local { path: Option<PathBuf> },
    /// Firestore documents in the given project.
    Firestore { project_id: String },
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// The group shown when a client has not picked one
    pub group_id: String,
    pub storage: StorageBackend,
    /// Firebase Web API key for anonymous sign-in (optional)
    pub firebase_api_key: Option<String>,
    /// Remote change-detection interval
    pub sync_poll_seconds: u64,
    /// Frontend URL, allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local {
                path: Some(PathBuf::from(
                    env::var("LOCAL_STORE_PATH")
                        .unwrap_or_else(|_| "data/km-ensemble.json".to_string()),
                )),
            },
            "firestore" => StorageBackend::Firestore {
                project_id: env::var("GCP_PROJECT_ID")
                    .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            group_id: env::var("GROUP_ID")
                .map(|v| v.trim().to_string())
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "MTL_ILES".to_string()),
            storage,
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .ok()
                .filter(|v| !v.is_empty()),
            sync_poll_seconds: parse_or("SYNC_POLL_SECONDS", 5)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,
        })
    }

    /// Local in-memory config for tests.
    pub fn test_default() -> Self {
        Self {
            group_id: "TEST_GROUP".to_string(),
            storage: StorageBackend::Local { path: None },
            firebase_api_key: None,
            sync_poll_seconds: 1,
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
        }
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
