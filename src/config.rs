//! Application configuration loaded from environment variables.
//!
//! Secrets (the legacy file-service token) are injected as environment
//! variables by the deployment and read once at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Cloud Firestore (or the emulator when FIRESTORE_EMULATOR_HOST is set)
    Firestore,
    /// In-process store; data is lost on restart
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP / Firebase project ID (also the expected ID-token audience)
    pub gcp_project_id: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Root directory of the blob store
    pub storage_dir: PathBuf,
    /// Shared secret guarding the legacy file service
    pub static_auth_token: String,
    /// Capacity of the in-memory request log
    pub request_log_capacity: usize,
    /// Requests allowed per client per window on `/api/v1`
    pub rate_limit_max: u32,
    /// Rate limit window
    pub rate_limit_window: Duration,
    /// Failed `/auth/verify` attempts allowed per client per window
    pub auth_verify_limit_max: u32,
    /// Maximum accepted blob upload size
    pub max_upload_bytes: usize,
    /// Document store implementation
    pub store_backend: StoreBackend,
}

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_REQUEST_LOG_CAPACITY: usize = 1000;
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
const DEFAULT_AUTH_VERIFY_LIMIT_MAX: u32 = 20;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: DEFAULT_PORT,
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            storage_dir: env::temp_dir().join("githide-test-storage"),
            static_auth_token: "test_static_token".to_string(),
            request_log_capacity: DEFAULT_REQUEST_LOG_CAPACITY,
            rate_limit_max: 10_000,
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            auth_verify_limit_max: DEFAULT_AUTH_VERIFY_LIMIT_MAX,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            store_backend: StoreBackend::Memory,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id = env::var("GCP_PROJECT_ID")
            .or_else(|_| env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?;

        let store_backend = match env::var("GITHIDE_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("firestore") | Err(_) => StoreBackend::Firestore,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    name: "GITHIDE_STORE",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            port: parse_or("PORT", DEFAULT_PORT)?,
            gcp_project_id,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage")),
            static_auth_token: env::var("AUTH_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH_TOKEN"))?,
            request_log_capacity: parse_or("REQUEST_LOG_CAPACITY", DEFAULT_REQUEST_LOG_CAPACITY)?,
            rate_limit_max: parse_or("RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX)?,
            rate_limit_window: Duration::from_secs(parse_or(
                "RATE_LIMIT_WINDOW_SECS",
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            )?),
            auth_verify_limit_max: parse_or("AUTH_VERIFY_LIMIT_MAX", DEFAULT_AUTH_VERIFY_LIMIT_MAX)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            store_backend,
        })
    }
}

/// Parse an optional numeric variable, rejecting values that are present but malformed.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
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
