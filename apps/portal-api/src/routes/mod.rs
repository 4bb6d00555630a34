//! HTTP routes for the SOW approval portal.

mod decision;
mod health;
mod pin;
mod sow;

use crate::state::AppState;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Build the application router with CORS applied.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/verify-pin", post(pin::verify_pin_handler))
        .route("/api/sow/{token}", get(sow::get_sow_handler))
        .route("/api/approve-sow", post(decision::approve_sow_handler))
        .route("/api/reject-sow", post(decision::reject_sow_handler))
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}

/// Build CORS layer from configured origins.
///
/// Wildcard allows any origin without credentials; explicit origins get an
/// allow-list with credentials enabled.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let is_wildcard = origins.len() == 1 && origins[0] == "*";

    let mut layer = CorsLayer::new().max_age(Duration::from_secs(3600));

    if is_wildcard {
        layer = layer
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    } else {
        use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
        use axum::http::Method;
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer = layer
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                AUTHORIZATION,
                CONTENT_TYPE,
                ACCEPT,
                axum::http::HeaderName::from_static("x-health-check-key"),
            ])
            .allow_credentials(true);
    }

    layer
}
