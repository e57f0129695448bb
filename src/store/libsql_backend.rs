//! libSQL backend for the resident registry.
//!
//! `Registry` owns the database handle and hands out one `RegistrySession`
//! (a fresh `libsql::Connection`) per unit of work. The connection is closed
//! when the session is dropped, so every exit path releases it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{NewUser, User, UserStore};

/// How long a session waits on a locked database before failing a statement.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_COLUMNS: &str =
    "id, vulnerability_type, address, phone_number, has_guardian, guardian_phone_number, wants_info_call";

/// Handle to the registry database file.
#[derive(Clone)]
pub struct Registry {
    db: Arc<LibSqlDatabase>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

impl Registry {
    /// Open (or create) the database file and run migrations.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::Pool(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let registry = Self { db: Arc::new(db) };
        {
            let session = registry.session()?;
            session
                .conn()
                .execute_batch("PRAGMA journal_mode=WAL;")
                .await
                .map_err(|e| DatabaseError::Pool(format!("Failed to enable WAL: {e}")))?;
            migrations::run_migrations(session.conn()).await?;
        }
        info!(path = %path.display(), "Registry opened");
        Ok(registry)
    }

    /// Acquire a session for one request.
    pub fn session(&self) -> Result<RegistrySession, DatabaseError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| DatabaseError::Pool(format!("Failed to set busy timeout: {e}")))?;
        Ok(RegistrySession { conn })
    }
}

/// A scoped registry connection. Dropping it releases the connection.
pub struct RegistrySession {
    conn: Connection,
}

impl RegistrySession {
    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn query_users(
        &self,
        op: &str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<User>, DatabaseError> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        let mut users = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => users.push(
                    row_to_user(&row).map_err(|e| DatabaseError::Query(format!("{op} row parse: {e}")))?,
                ),
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("{op}: {e}"))),
            }
        }
        Ok(users)
    }
}

impl std::fmt::Debug for RegistrySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySession").finish_non_exhaustive()
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Map a libsql Row to a User. Column order matches USER_COLUMNS.
fn row_to_user(row: &libsql::Row) -> Result<User, libsql::Error> {
    Ok(User {
        id: row.get(0)?,
        vulnerability_type: row.get(1)?,
        address: row.get(2)?,
        phone_number: row.get(3)?,
        has_guardian: row.get::<i64>(4)? != 0,
        guardian_phone_number: row.get(5).ok(),
        wants_info_call: row.get::<i64>(6)? != 0,
    })
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl UserStore for RegistrySession {
    async fn insert_user(&self, user: &NewUser) -> Result<User, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO users (vulnerability_type, address, phone_number, has_guardian,
                    guardian_phone_number, wants_info_call)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.vulnerability_type.as_str(),
                    user.address.as_str(),
                    user.phone_number.as_str(),
                    i64::from(user.has_guardian),
                    opt_text(user.guardian_phone_number.as_deref()),
                    i64::from(user.wants_info_call),
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write("insert_user", e))?;

        let created = self
            .get_user_by_phone(&user.phone_number)
            .await?
            .ok_or_else(|| DatabaseError::Query("insert_user: row missing after insert".into()))?;

        debug!(user_id = created.id, phone = %created.phone_number, "User inserted into DB");
        Ok(created)
    }

    async fn get_user_by_phone(&self, phone_number: &str) -> Result<Option<User>, DatabaseError> {
        let mut users = self
            .query_users(
                "get_user_by_phone",
                &format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number = ?1 LIMIT 1"),
                params![phone_number],
            )
            .await?;
        Ok(users.pop())
    }

    async fn list_users(&self, skip: u32, limit: u32) -> Result<Vec<User>, DatabaseError> {
        self.query_users(
            "list_users",
            &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT ?1 OFFSET ?2"),
            params![i64::from(limit), i64::from(skip)],
        )
        .await
    }

    async fn find_users_by_address(&self, keyword: &str) -> Result<Vec<User>, DatabaseError> {
        // instr() is a plain case-sensitive substring test; LIKE would treat
        // % and _ as wildcards and fold ASCII case.
        self.query_users(
            "find_users_by_address",
            &format!("SELECT {USER_COLUMNS} FROM users WHERE instr(address, ?1) > 0 ORDER BY id ASC"),
            params![keyword],
        )
        .await
    }
}

// ── Tests ───────────────────────────────────────────────────────────
