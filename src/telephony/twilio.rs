//! Twilio REST client (Messages and Calls resources).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::info;

use super::{Telephony, preview};
use crate::config::TwilioConfig;
use crate::error::TelephonyError;

const PROVIDER: &str = "twilio";

pub struct TwilioClient {
    client: reqwest::Client,
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
    api_base: String,
}

impl TwilioClient {
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn resource_url(&self, resource: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/{resource}.json",
            self.api_base, self.account_sid
        )
    }

    async fn create(&self, resource: &str, form: &[(&str, &str)]) -> Result<String, TelephonyError> {
        let resp = self
            .client
            .post(self.resource_url(resource))
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(form)
            .send()
            .await
            .map_err(|e| TelephonyError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return Err(TelephonyError::Api {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatedResource =
            resp.json().await.map_err(|e| TelephonyError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;
        Ok(created.sid)
    }
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("account_sid", &self.account_sid)
            .field("from_number", &self.from_number)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Deserialize)]
struct CreatedResource {
    sid: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl Telephony for TwilioClient {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, TelephonyError> {
        let sid = self
            .create(
                "Messages",
                &[("To", to), ("From", self.from_number.as_str()), ("Body", body)],
            )
            .await?;
        info!(to = %to, sid = %sid, body = %preview(body), "SMS sent");
        Ok(sid)
    }

    async fn place_call(&self, to: &str, twiml: &str) -> Result<String, TelephonyError> {
        let sid = self
            .create("Calls", &[("To", to), ("From", self.from_number.as_str()), ("Twiml", twiml)])
            .await?;
        info!(to = %to, sid = %sid, "Call initiated");
        Ok(sid)
    }
}
