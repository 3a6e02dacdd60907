use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, QueryRequest, QueryResponse};
use crate::domain::Query;

/// POST /v1/query
pub async fn process_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    debug!(model = ?request.model, "Processing query request");

    let query = match request.session_id {
        Some(session) => Query::new(request.query, session),
        None => Query::anonymous(request.query),
    };

    let result = state
        .context
        .process_query(&query, request.model.as_deref())
        .await?;

    Ok(Json(QueryResponse::from_result(
        result,
        state.context.composite_weights(),
    )))
}
