use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{BackendInfo, Json, ModelsResponse};

/// GET /v1/models
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let active = state.context.active_backend().await;
    let models = state.context.models().iter().map(BackendInfo::from).collect();

    Json(ModelsResponse {
        active: active.name,
        models,
    })
}
