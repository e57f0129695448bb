//! `UserStore` trait: async interface over the resident registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// A registered resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Vulnerability category (e.g. "고령자", "장애인").
    pub vulnerability_type: String,
    pub address: String,
    /// Unique across the registry.
    pub phone_number: String,
    pub has_guardian: bool,
    pub guardian_phone_number: Option<String>,
    /// Opted in to informational voice calls.
    pub wants_info_call: bool,
}

/// Registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub vulnerability_type: String,
    pub address: String,
    pub phone_number: String,
    #[serde(default)]
    pub has_guardian: bool,
    #[serde(default)]
    pub guardian_phone_number: Option<String>,
    #[serde(default = "default_wants_info_call")]
    pub wants_info_call: bool,
}

fn default_wants_info_call() -> bool {
    true
}

impl NewUser {
    pub fn new(
        vulnerability_type: impl Into<String>,
        address: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            vulnerability_type: vulnerability_type.into(),
            address: address.into(),
            phone_number: phone_number.into(),
            has_guardian: false,
            guardian_phone_number: None,
            wants_info_call: true,
        }
    }

    pub fn with_guardian(mut self, guardian_phone_number: impl Into<String>) -> Self {
        self.has_guardian = true;
        self.guardian_phone_number = Some(guardian_phone_number.into());
        self
    }
}

/// Backend-agnostic registry operations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. A duplicate phone number yields `DatabaseError::Constraint`.
    async fn insert_user(&self, user: &NewUser) -> Result<User, DatabaseError>;

    /// Look up a user by phone number.
    async fn get_user_by_phone(&self, phone_number: &str) -> Result<Option<User>, DatabaseError>;

    /// List users in storage order.
    async fn list_users(&self, skip: u32, limit: u32) -> Result<Vec<User>, DatabaseError>;

    /// Users whose address contains `keyword` (case-sensitive substring).
    async fn find_users_by_address(&self, keyword: &str) -> Result<Vec<User>, DatabaseError>;
}
