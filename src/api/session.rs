//! Per-request registry session extractor.

use std::ops::Deref;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::AppState;
use super::error::ApiError;
use crate::store::RegistrySession;

/// A registry connection scoped to one request. Released when the handler
/// returns, on success and error alike.
#[derive(Debug)]
pub struct DbSession(pub RegistrySession);

impl Deref for DbSession {
    type Target = RegistrySession;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for DbSession {
    type Rejection = ApiError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(DbSession(state.registry.session()?))
    }
}
