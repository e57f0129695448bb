//! Error types for disaster-notify.

use std::path::PathBuf;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Registry database errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl DatabaseError {
    /// Classify a libsql error raised by a write: UNIQUE/constraint failures
    /// become `Constraint`, everything else `Query`.
    pub fn from_write(op: &str, err: libsql::Error) -> Self {
        let text = err.to_string();
        if text.contains("UNIQUE constraint failed") || text.contains("constraint failed") {
            DatabaseError::Constraint(format!("{op}: {text}"))
        } else {
            DatabaseError::Query(format!("{op}: {text}"))
        }
    }
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Knowledge index errors (build, load, search).
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Manuals directory not found: {}", .0.display())]
    ManualsMissing(PathBuf),

    #[error("No documents found or read from {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("Embedding generation failed: {reason}")]
    EmbeddingFailed { reason: String },

    #[error("Corrupt index at {}: {reason}", .path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Telephony provider errors.
#[derive(Debug, thiserror::Error)]
pub enum TelephonyError {
    #[error("Telephony client not configured")]
    NotConfigured,

    #[error("Request to {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("{provider} rejected the request ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Shelter lookup proxy errors.
#[derive(Debug, thiserror::Error)]
pub enum ShelterError {
    #[error("Safety Data API key not configured")]
    NotConfigured,

    #[error("Failed to connect to Safety Data API: {0}")]
    Connect(String),

    #[error("Safety Data API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Safety API Error: {0}")]
    Api(String),

    #[error("Failed to decode Safety Data API response: {0}")]
    Decode(String),
}
