//! Configuration management for the AgriBot gateway

use std::path::PathBuf;

use crate::{Error, Result};

/// Default Graph API version when `GRAPH_API_VERSION` is unset
pub const DEFAULT_GRAPH_API_VERSION: &str = "v17.0";

/// Gateway configuration
///
/// Built once at startup from environment variables and passed by reference
/// to each component. No process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    /// WhatsApp Business (Graph) API settings
    pub whatsapp: WhatsAppConfig,

    /// Object storage settings; `None` disables media ingestion
    pub storage: Option<StorageConfig>,

    /// Path to the `SQLite` database file
    pub db_path: PathBuf,
}

/// WhatsApp Business API settings
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Webhook handshake verification token
    pub verify_token: String,

    /// Bearer token for Graph API calls
    pub access_token: String,

    /// Phone number ID registered with WhatsApp Business
    pub phone_number_id: String,

    /// Graph API version segment (e.g. "v17.0")
    pub graph_api_version: String,
}

/// S3-compatible object storage settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Access key ID
    pub access_key_id: String,

    /// Secret access key
    pub secret_access_key: String,

    /// Bucket receiving media objects
    pub bucket: String,

    /// Endpoint URL (path-style addressing)
    pub endpoint_url: String,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing
    pub fn from_env() -> Result<Self> {
        let whatsapp = WhatsAppConfig {
            verify_token: require_env("VERIFY_TOKEN")?,
            access_token: require_env("ACCESS_TOKEN")?,
            phone_number_id: require_env("PHONE_NUMBER_ID")?,
            graph_api_version: std::env::var("GRAPH_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_GRAPH_API_VERSION.to_string()),
        };

        let storage = StorageConfig::from_env();
        if storage.is_none() {
            tracing::warn!("object storage not configured, media ingestion disabled");
        }

        let db_path = std::env::var("DATABASE_PATH").map_or_else(|_| default_db_path(), PathBuf::from);

        Ok(Self {
            whatsapp,
            storage,
            db_path,
        })
    }
}

impl StorageConfig {
    /// Load storage settings from the environment
    ///
    /// Returns `None` unless credentials and a bucket are all present. The
    /// endpoint may be given directly via `ENDPOINT_URL` or derived from
    /// `ACCOUNT_ID` using the Cloudflare R2 convention.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let access_key_id = std::env::var("ACCESS_KEY_ID").ok()?;
        let secret_access_key = std::env::var("SECRET_ACCESS_KEY").ok()?;
        let bucket = std::env::var("BUCKET_NAME").ok()?;

        let endpoint_url = std::env::var("ENDPOINT_URL").ok().or_else(|| {
            std::env::var("ACCOUNT_ID")
                .ok()
                .map(|account| format!("https://{account}.r2.cloudflarestorage.com"))
        })?;

        Some(Self {
            access_key_id,
            secret_access_key,
            bucket,
            endpoint_url,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{name} must be set")))
}

/// Default database location (`~/.local/share/omni/agribot/messages.db` on Linux)
fn default_db_path() -> PathBuf {
    let data_dir = directories::ProjectDirs::from("dev", "omni", "omni")
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("agribot"));

    std::fs::create_dir_all(&data_dir).ok();

    data_dir.join("messages.db")
}
