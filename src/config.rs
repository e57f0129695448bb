//! Configuration types, read from the environment at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Placeholder value shipped in `.env.example`; treated as unset.
const UPSTAGE_KEY_PLACEHOLDER: &str = "YOUR_UPSTAGE_API_KEY";

/// Twilio credentials. Present only when all three variables are set.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub from_number: String,
    /// REST base URL (overridable for tests).
    pub api_base: String,
}

impl TwilioConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.twilio.com";

    /// Load from `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER`.
    pub fn from_env() -> Option<Self> {
        let account_sid = non_empty_var("TWILIO_ACCOUNT_SID")?;
        let auth_token = non_empty_var("TWILIO_AUTH_TOKEN")?;
        let from_number = non_empty_var("TWILIO_PHONE_NUMBER")?;
        let api_base = std::env::var("TWILIO_API_BASE")
            .unwrap_or_else(|_| Self::DEFAULT_API_BASE.to_string());

        Some(Self {
            account_sid,
            auth_token: SecretString::from(auth_token),
            from_number,
            api_base,
        })
    }
}

/// Upstage Solar settings for embeddings and chat generation.
#[derive(Debug, Clone)]
pub struct UpstageConfig {
    pub api_key: SecretString,
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl UpstageConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.upstage.ai/v1";

    /// Load from `UPSTAGE_API_KEY`; `None` when unset or still the placeholder.
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_var("UPSTAGE_API_KEY")?;
        if api_key == UPSTAGE_KEY_PLACEHOLDER {
            return None;
        }

        Some(Self {
            api_key: SecretString::from(api_key),
            api_base: std::env::var("UPSTAGE_API_BASE")
                .unwrap_or_else(|_| Self::DEFAULT_API_BASE.to_string()),
            chat_model: std::env::var("UPSTAGE_CHAT_MODEL")
                .unwrap_or_else(|_| "solar-pro".to_string()),
            embedding_model: std::env::var("UPSTAGE_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "solar-embedding-1-large".to_string()),
        })
    }
}

/// Shelter lookup proxy settings.
#[derive(Debug, Clone)]
pub struct ShelterConfig {
    pub service_key: Option<SecretString>,
    pub api_url: String,
    pub timeout: Duration,
}

impl ShelterConfig {
    pub const DEFAULT_API_URL: &'static str = "https://www.safetydata.go.kr/V2/api/DSSP-IF-10941";

    pub fn from_env() -> Self {
        Self {
            service_key: non_empty_var("SAFETY_DATA_SERVICE_KEY").map(SecretString::from),
            api_url: std::env::var("SAFETY_DATA_API_URL")
                .unwrap_or_else(|_| Self::DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for ShelterConfig {
    fn default() -> Self {
        Self {
            service_key: None,
            api_url: Self::DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Knowledge base locations.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// Directory holding the serialized index.
    pub index_path: PathBuf,
    /// Directory of plain-text manuals used to rebuild the index.
    pub manuals_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Number of chunks stuffed into the generation prompt.
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./knowledge_index"),
            manuals_dir: PathBuf::from("./how-to-s"),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 4,
        }
    }
}

impl KnowledgeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            index_path: std::env::var("KNOWLEDGE_INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_path),
            manuals_dir: std::env::var("MANUALS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.manuals_dir),
            ..defaults
        }
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub static_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub kakao_map_app_key: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub twilio: Option<TwilioConfig>,
    pub upstage: Option<UpstageConfig>,
    pub shelter: ShelterConfig,
    pub knowledge: KnowledgeConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = match std::env::var("DISASTER_NOTIFY_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DISASTER_NOTIFY_PORT".to_string(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            Err(_) => 30000,
        };

        let database_path = match std::env::var("DATABASE_URL") {
            Ok(url) => database_path_from_url(&url)?,
            Err(_) => PathBuf::from("./data/users.db"),
        };

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: std::env::var("DISASTER_NOTIFY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_path,
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./static")),
            cors_origins,
            kakao_map_app_key: non_empty_var("KAKAO_MAP_APP_KEY"),
            log_dir: std::env::var("DISASTER_NOTIFY_LOG_DIR").ok().map(PathBuf::from),
            twilio: TwilioConfig::from_env(),
            upstage: UpstageConfig::from_env(),
            shelter: ShelterConfig::from_env(),
            knowledge: KnowledgeConfig::from_env(),
        })
    }
}

/// Resolve `DATABASE_URL` into a filesystem path.
///
/// Accepts `sqlite:///absolute/path`, `sqlite:///./relative/path` and bare paths.
pub fn database_path_from_url(url: &str) -> Result<PathBuf, ConfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "DATABASE_URL".to_string(),
            message: "empty value".to_string(),
        });
    }

    if let Some(rest) = url.strip_prefix("sqlite:///") {
        if let Some(relative) = rest.strip_prefix("./") {
            return Ok(Path::new(".").join(relative));
        }
        return Ok(PathBuf::from(format!("/{rest}")));
    }

    if url.contains("://") {
        return Err(ConfigError::InvalidValue {
            key: "DATABASE_URL".to_string(),
            message: format!("unsupported scheme in '{url}', expected sqlite:///"),
        });
    }

    Ok(PathBuf::from(url))
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
