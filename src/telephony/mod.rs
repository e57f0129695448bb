//! Outbound SMS/voice and inbound webhook TwiML.

pub mod dispatcher;
pub mod twilio;
pub mod twiml;

pub use dispatcher::{DispatchOutcome, dispatch};
pub use twilio::TwilioClient;

use async_trait::async_trait;

use crate::error::TelephonyError;

/// An SMS/voice provider. Both calls return the provider's resource id.
#[async_trait]
pub trait Telephony: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, TelephonyError>;

    /// Place a call that plays `twiml`.
    async fn place_call(&self, to: &str, twiml: &str) -> Result<String, TelephonyError>;
}

/// Shorten a message body for logging.
pub(crate) fn preview(body: &str) -> String {
    const MAX: usize = 50;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_counts_characters() {
        assert_eq!(preview("짧은 문장"), "짧은 문장");
        let long = "가".repeat(60);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 53);
        assert!(p.ends_with("..."));
    }
}
