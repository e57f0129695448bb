//! Disaster simulation endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};

use super::AppState;
use super::error::ApiError;
use super::session::DbSession;
use crate::alert::{self, DisasterAlert};

pub async fn simulate_disaster(
    State(state): State<AppState>,
    db: DbSession,
    payload: Result<Json<DisasterAlert>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(alert) = payload?;
    let report = alert::simulate(
        alert,
        &*db,
        &state.generator,
        state.telephony.as_deref(),
    )
    .await;
    Ok(Json(report))
}
