use axum::extract::State;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, BackendInfo, Json, ReconfigureRequest, ReconfigureResponse};

/// POST /admin/backend
pub async fn reconfigure_backend(
    State(state): State<AppState>,
    Json(request): Json<ReconfigureRequest>,
) -> Result<Json<ReconfigureResponse>, ApiError> {
    let model = request.model.trim();
    if model.is_empty() {
        return Err(ApiError::bad_request("Model name cannot be empty"));
    }

    let active = state.context.reconfigure(model).await?;
    info!(model = %active.spec.name, "Backend reconfigured via admin API");

    Ok(Json(ReconfigureResponse {
        active: BackendInfo::from(&active.spec),
    }))
}
