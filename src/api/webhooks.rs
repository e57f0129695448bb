//! Inbound Twilio webhooks. Form bodies in, TwiML out.

use axum::{
    Form,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::telephony::twiml::{self, VoiceIntent};

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SmsWebhook {
    #[serde(rename = "Body")]
    body: String,
}

#[derive(Debug, Deserialize)]
pub struct GatherWebhook {
    #[serde(rename = "SpeechResult", default)]
    speech_result: String,
    #[serde(rename = "From", default)]
    from: String,
}

pub async fn sms_reply(Form(msg): Form<SmsWebhook>) -> Response {
    info!(body = %msg.body, "Inbound SMS");
    xml(twiml::sms_reply(&msg.body))
}

pub async fn voice() -> Response {
    xml(twiml::voice_menu())
}

pub async fn handle_gather(Form(gather): Form<GatherWebhook>) -> Response {
    let intent = VoiceIntent::classify(&gather.speech_result);
    info!(from = %gather.from, speech = %gather.speech_result.trim(), ?intent, "Speech gathered");
    xml(intent.response())
}
