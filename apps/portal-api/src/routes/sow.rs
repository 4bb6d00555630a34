//! SOW display data endpoint.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use sow_crm::SowData;

pub async fn get_sow_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SowData>, ApiError> {
    state
        .deals
        .sow_data(&token)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("SOW not found".to_string()))
}
