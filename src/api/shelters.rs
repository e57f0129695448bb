//! Shelter lookup proxy endpoint.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ShelterParams {
    region: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_rows")]
    rows: u32,
}

fn default_page() -> u32 {
    1
}

fn default_rows() -> u32 {
    10
}

pub async fn get_shelters(
    State(state): State<AppState>,
    params: Result<Query<ShelterParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let data = state
        .shelters
        .lookup(&params.region, params.page, params.rows)
        .await?;
    Ok(Json(data))
}
