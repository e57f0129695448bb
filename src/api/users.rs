//! User registry endpoints.

use axum::{
    Json,
    extract::{
        Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use super::error::ApiError;
use super::session::DbSession;
use crate::store::{NewUser, UserStore};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    100
}

pub async fn create_user(
    db: DbSession,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(user) = payload?;
    if db.get_user_by_phone(&user.phone_number).await?.is_some() {
        return Err(ApiError::Conflict(
            "Phone number already registered".to_string(),
        ));
    }
    let created = db.insert_user(&user).await?;
    info!(id = created.id, phone = %created.phone_number, "User registered");
    Ok((StatusCode::OK, Json(created)))
}

pub async fn list_users(
    db: DbSession,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let users = db.list_users(params.skip, params.limit).await?;
    Ok(Json(users))
}

pub async fn get_user(
    db: DbSession,
    Path(phone_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match db.get_user_by_phone(&phone_number).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound("User not found".to_string())),
    }
}
