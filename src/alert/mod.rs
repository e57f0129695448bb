//! Disaster alert pipeline: filter recipients, compose guidance, dispatch.

pub mod model;
pub mod region;

pub use model::DisasterAlert;
pub use region::{filter_target_users, region_keyword};

use serde::Serialize;
use tracing::info;

use crate::knowledge::GuidanceGenerator;
use crate::store::{User, UserStore};
use crate::telephony::{Telephony, dispatch};

/// A message addressed to one registered user.
#[derive(Debug, Clone)]
pub struct Notification {
    pub user: User,
    pub message: String,
}

/// Result of one simulated alert, as returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub status: String,
    pub received_data: DisasterAlert,
    pub filtered_user_count: usize,
    pub successful_notifications: usize,
    pub failed_notifications: usize,
}

/// Run an alert through the whole pipeline. Only counts are reported; no
/// stage failure aborts the run.
pub async fn simulate(
    alert: DisasterAlert,
    store: &dyn UserStore,
    generator: &GuidanceGenerator,
    telephony: Option<&dyn Telephony>,
) -> SimulationReport {
    info!(
        serial = %alert.serial,
        region = %alert.region,
        hazard = %alert.hazard_type,
        "Simulating disaster alert"
    );

    let users = filter_target_users(&alert, store).await;
    let filtered_user_count = users.len();

    let notifications = generator.compose(&alert, users).await;
    let outcome = dispatch(telephony, &notifications).await;

    SimulationReport {
        status: "Disaster simulation processed".to_string(),
        received_data: alert,
        filtered_user_count,
        successful_notifications: outcome.success,
        failed_notifications: outcome.failed,
    }
}
