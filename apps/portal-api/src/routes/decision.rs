//! Approve and reject endpoints.
//!
//! Both endpoints gate on the deal's lifecycle status: only a SOW currently
//! in `needs_review` can be finalized, so a stale browser tab cannot flip an
//! already-decided record.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sow_crm::records::Deal;
use sow_crm::SowStatus;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveSowRequest {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    approver_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectSowRequest {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Minimal shape check; the CRM holds the authoritative contact record.
fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Fetch the deal for a token and require it to be awaiting review.
async fn reviewable_deal(state: &AppState, token: &str) -> Result<Deal, ApiError> {
    let deal = state
        .deals
        .find_deal_by_token(token)
        .await?
        .ok_or_else(|| ApiError::NotFound("SOW not found".to_string()))?;

    let status = deal.property("sow_status").and_then(SowStatus::parse);
    if status != Some(SowStatus::NeedsReview) {
        let shown = status.map_or("finalized", |s| s.as_str());
        return Err(ApiError::Conflict(format!("SOW already {shown}")));
    }
    Ok(deal)
}

/// Record the decision as a note on the deal. Best effort: the status patch
/// already landed, so a note failure must not fail the request.
async fn record_decision_note(state: &AppState, deal_id: &str, body: &str) {
    let result = state
        .files
        .create_note_with_attachment(deal_id, body, &[])
        .await;
    if let Err(e) = result {
        warn!(deal_id, error = %e, "failed to record decision note");
    }
}

pub async fn approve_sow_handler(
    State(state): State<AppState>,
    Json(request): Json<ApproveSowRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = request
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Token is required".to_string()))?;
    let approver_email = request
        .approver_email
        .as_deref()
        .filter(|e| is_plausible_email(e))
        .ok_or_else(|| ApiError::BadRequest("A valid approver email is required".to_string()))?;

    let deal = reviewable_deal(&state, token).await?;
    let approved_at = Utc::now().to_rfc3339();

    let mut properties = Map::new();
    properties.insert("sow_status".to_string(), json!(SowStatus::Approved.as_str()));
    properties.insert("sow_accepted_date".to_string(), json!(approved_at));
    state.deals.update_deal(&deal.id, properties).await?;
    record_decision_note(
        &state,
        &deal.id,
        &format!("SOW approved by {approver_email} on {approved_at}"),
    )
    .await;

    info!(deal_id = %deal.id, approver = %approver_email, "SOW approved");
    Ok(Json(json!({ "success": true, "approvedAt": approved_at })))
}

pub async fn reject_sow_handler(
    State(state): State<AppState>,
    Json(request): Json<RejectSowRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = request
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Token is required".to_string()))?;

    let deal = reviewable_deal(&state, token).await?;
    let rejected_at = Utc::now().to_rfc3339();

    let mut properties = Map::new();
    properties.insert("sow_status".to_string(), json!(SowStatus::Rejected.as_str()));
    properties.insert("sow_rejected_date".to_string(), json!(rejected_at));
    if let Some(reason) = request.reason.as_deref().filter(|r| !r.is_empty()) {
        properties.insert("sow_rejected_reason".to_string(), json!(reason));
    }
    state.deals.update_deal(&deal.id, properties).await?;
    let note = match request.reason.as_deref().filter(|r| !r.is_empty()) {
        Some(reason) => format!("SOW rejected on {rejected_at}: {reason}"),
        None => format!("SOW rejected on {rejected_at}"),
    };
    record_decision_note(&state, &deal.id, &note).await;

    info!(deal_id = %deal.id, "SOW rejected");
    Ok(Json(json!({ "success": true, "rejectedAt": rejected_at })))
}
