//! Ad-hoc SMS and voice call endpoints.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use crate::error::TelephonyError;
use crate::telephony::twiml;

#[derive(Debug, Deserialize)]
pub struct OutboundRequest {
    to: String,
    message: String,
}

pub async fn send_sms(
    State(state): State<AppState>,
    payload: Result<Json<OutboundRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let telephony = state.telephony.as_ref().ok_or(TelephonyError::NotConfigured)?;
    let sid = telephony.send_sms(&req.to, &req.message).await?;
    Ok(Json(serde_json::json!({"status": "SMS sent", "sid": sid})))
}

pub async fn make_call(
    State(state): State<AppState>,
    payload: Result<Json<OutboundRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let telephony = state.telephony.as_ref().ok_or(TelephonyError::NotConfigured)?;
    let sid = telephony
        .place_call(&req.to, &twiml::call_announcement(&req.message))
        .await?;
    Ok(Json(serde_json::json!({"status": "Call initiated", "sid": sid})))
}
