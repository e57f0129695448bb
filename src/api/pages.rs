//! Frontend entry point and Kakao map pages.

use std::path::PathBuf;
use std::sync::LazyLock;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use regex::Regex;
use tracing::{debug, warn};

use super::AppState;
use super::error::ApiError;

/// Map pages that may be served.
const ALLOWED_MAPS: &[&str] = &["map_api", "map_wide", "shelter_temp", "temp"];

static APP_KEY_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*kakao_map_app_key\s*\}\}").expect("placeholder pattern is valid")
});

/// Static page settings.
#[derive(Debug, Clone)]
pub struct PageConfig {
    pub static_dir: PathBuf,
    /// Empty when unset.
    pub kakao_map_app_key: String,
}

/// Substitute the map key into a template.
pub fn render_map(template: &str, app_key: &str) -> String {
    APP_KEY_PLACEHOLDER
        .replace_all(template, regex::NoExpand(app_key))
        .into_owned()
}

pub async fn map(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Html<String>, ApiError> {
    let base = name.strip_suffix(".html").unwrap_or(&name);
    if !ALLOWED_MAPS.contains(&base) {
        return Err(ApiError::NotFound("Map not found".to_string()));
    }

    let path = state.pages.static_dir.join("maps").join(format!("{base}.html"));
    let template = tokio::fs::read_to_string(&path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "Map template unreadable");
        ApiError::NotFound("Map template not found or error rendering".to_string())
    })?;
    debug!(map = %base, "Serving map");
    Ok(Html(render_map(&template, &state.pages.kakao_map_app_key)))
}

pub async fn index(State(state): State<AppState>) -> Response {
    let path = state.pages.static_dir.join("app").join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Html("Frontend not built or index.html not found in static/app"),
        )
            .into_response(),
    }
}
