//! Health endpoint with two-level disclosure.
//!
//! Unauthenticated callers (uptime monitors) get a coarse status only.
//! Callers presenting the configured `X-Health-Check-Key` get the full
//! provisioning diagnostics. When no key is configured, the full shape is
//! never served.

use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

const HEALTH_KEY_HEADER: &str = "x-health-check-key";

pub async fn health_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let summary = state.health.summary().await;

    let authorized = match &state.health_check_api_key {
        Some(expected) => headers
            .get(HEALTH_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|presented| presented == expected),
        None => false,
    };

    if authorized {
        Json(json!({
            "status": summary.status(),
            "timestamp": Utc::now().to_rfc3339(),
            "details": summary,
        }))
        .into_response()
    } else {
        Json(json!({
            "status": summary.status(),
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response()
    }
}
