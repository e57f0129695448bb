//! HTTP surface: registry, messaging, simulation, shelters, webhooks, pages.

pub mod error;
pub mod messaging;
pub mod pages;
pub mod session;
pub mod shelters;
pub mod simulate;
pub mod users;
pub mod webhooks;

pub use error::ApiError;
pub use pages::PageConfig;
pub use session::DbSession;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::warn;

use crate::knowledge::GuidanceGenerator;
use crate::shelter::ShelterClient;
use crate::store::Registry;
use crate::telephony::Telephony;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub generator: Arc<GuidanceGenerator>,
    /// None when Twilio credentials are missing.
    pub telephony: Option<Arc<dyn Telephony>>,
    pub shelters: Arc<ShelterClient>,
    pub pages: Arc<PageConfig>,
}

/// Build the full router.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let static_dir = state.pages.static_dir.clone();

    Router::new()
        .route("/health", get(health))
        .route("/", get(pages::index))
        .route("/map/{name}", get(pages::map))
        .route("/api/users", post(users::create_user).get(users::list_users))
        .route("/api/users/", post(users::create_user).get(users::list_users))
        .route("/api/users/{phone_number}", get(users::get_user))
        .route("/api/send_sms", post(messaging::send_sms))
        .route("/api/make_call", post(messaging::make_call))
        .route("/api/shelters", get(shelters::get_shelters))
        .route("/api/simulate_disaster", post(simulate::simulate_disaster))
        .route("/twilio/sms", post(webhooks::sms_reply))
        .route("/twilio/voice", post(webhooks::voice))
        .route("/twilio/handle-gather", post(webhooks::handle_gather))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials rule out wildcard headers, so requested headers are mirrored.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "disaster-notify"
    }))
}
