//! Persistence layer: libSQL-backed resident registry.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::{Registry, RegistrySession};
pub use traits::{NewUser, User, UserStore};
