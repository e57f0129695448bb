//! Request error taxonomy and its JSON rendering.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::error::{DatabaseError, ShelterError, TelephonyError};

/// Errors a handler can return. Rendered as `{"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The body or query string did not match the expected shape.
    #[error("{0}")]
    Unprocessable(String),

    /// A required integration has no credentials.
    #[error("{0}")]
    Unconfigured(String),

    #[error("{detail}")]
    Upstream { status: StatusCode, detail: String },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unconfigured(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Constraint(_) => {
                ApiError::Conflict("Phone number already registered".to_string())
            }
            other => {
                error!(error = %other, "Registry error");
                ApiError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<ShelterError> for ApiError {
    fn from(err: ShelterError) -> Self {
        match err {
            ShelterError::NotConfigured => ApiError::Unconfigured(err.to_string()),
            ShelterError::Connect(_) => ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                detail: "Failed to connect to Safety Data API".to_string(),
            },
            ShelterError::Status { status, .. } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                detail: "Error received from Safety Data API".to_string(),
            },
            ShelterError::Api(_) => ApiError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: err.to_string(),
            },
            ShelterError::Decode(reason) => {
                error!(reason = %reason, "Undecodable Safety Data API response");
                ApiError::Internal(
                    "An internal error occurred while fetching shelter data".to_string(),
                )
            }
        }
    }
}

impl From<TelephonyError> for ApiError {
    fn from(err: TelephonyError) -> Self {
        match err {
            TelephonyError::NotConfigured => {
                ApiError::Unconfigured("Twilio client not configured".to_string())
            }
            other => {
                error!(error = %other, "Telephony request failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}
