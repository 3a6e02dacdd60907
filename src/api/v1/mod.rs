//! Query, classification and evaluation endpoints

mod classify;
mod evaluate;
mod models;
mod query;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::process_query))
        .route("/classify", post(classify::classify))
        .route("/evaluate", post(evaluate::evaluate))
        .route("/models", get(models::list_models))
}
