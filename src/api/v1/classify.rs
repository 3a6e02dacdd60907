use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ClassifyRequest, ClassifyResponse, Json};

/// POST /v1/classify
pub async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let classification = state.context.classify(&request.query)?;
    Ok(Json(classification.into()))
}
