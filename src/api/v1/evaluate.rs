use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, EvaluateRequest, Json, QueryResponse};
use crate::domain::Query;

/// POST /v1/evaluate
///
/// Scores the supplied answer as if the pipeline had produced it.
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    debug!(domain = ?request.domain, "Evaluating supplied answer");

    let query = Query::anonymous(request.query);
    let result = state.context.evaluate_answer(
        &query,
        &request.answer,
        request.domain,
        request.confidence,
        request.variants.as_deref(),
    )?;

    Ok(Json(QueryResponse::from_result(
        result,
        state.context.composite_weights(),
    )))
}
