//! PIN verification endpoint.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sow_crm::PinVerification;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct VerifyPinRequest {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    pin: Option<String>,
}

/// Verify a homeowner's token + PIN pair.
///
/// Unknown tokens and wrong PINs get the same 401 so a caller cannot probe
/// which tokens exist. Finalized SOWs get a 409 naming the current status.
pub async fn verify_pin_handler(
    State(state): State<AppState>,
    Json(request): Json<VerifyPinRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = request
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Token and PIN are required".to_string()))?;
    let pin = request
        .pin
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Token and PIN are required".to_string()))?;

    match state.deals.verify_pin(token, pin).await? {
        PinVerification::Verified { deal_id } => {
            info!(deal_id = %deal_id, "PIN verified");
            Ok(Json(json!({ "valid": true, "dealId": deal_id })))
        }
        PinVerification::UnknownToken | PinVerification::WrongPin => Err(ApiError::Unauthorized(
            "Invalid token or PIN".to_string(),
        )),
        PinVerification::AlreadyFinalized { status, .. } => {
            let shown = status.map_or("finalized", |s| s.as_str());
            Err(ApiError::Conflict(format!("SOW already {shown}")))
        }
    }
}
