//! Disaster Notify: vulnerable-resident registry and disaster alert fan-out.

pub mod alert;
pub mod api;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod shelter;
pub mod store;
pub mod telephony;
