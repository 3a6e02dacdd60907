//! Operator endpoints

mod backend;

use axum::{routing::post, Router};

use super::state::AppState;

pub fn create_admin_router() -> Router<AppState> {
    Router::new().route("/backend", post(backend::reconfigure_backend))
}
