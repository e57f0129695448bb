//! Sequential SMS fan-out for composed notifications.

use serde::Serialize;
use tracing::{error, info, warn};

use super::{Telephony, preview};
use crate::alert::Notification;

/// Per-run send tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub success: usize,
    pub failed: usize,
}

/// Send one SMS per notification. Failures are counted, never retried.
/// Without a provider every notification counts as failed.
pub async fn dispatch(
    telephony: Option<&dyn Telephony>,
    notifications: &[Notification],
) -> DispatchOutcome {
    let Some(telephony) = telephony else {
        warn!(
            count = notifications.len(),
            "Telephony not configured, notifications not sent"
        );
        return DispatchOutcome {
            success: 0,
            failed: notifications.len(),
        };
    };

    let mut outcome = DispatchOutcome::default();
    for notification in notifications {
        let to = notification.user.phone_number.as_str();
        info!(to = %to, body = %preview(&notification.message), "Sending notification");
        match telephony.send_sms(to, &notification.message).await {
            Ok(_) => outcome.success += 1,
            Err(e) => {
                error!(to = %to, error = %e, "Notification failed");
                outcome.failed += 1;
            }
        }
    }

    info!(
        success = outcome.success,
        failed = outcome.failed,
        "Dispatch finished"
    );
    outcome
}
