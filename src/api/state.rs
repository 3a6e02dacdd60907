//! Shared handler state

use std::sync::Arc;

use crate::infrastructure::services::FairContext;

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<FairContext>,
}

impl AppState {
    pub fn new(context: Arc<FairContext>) -> Self {
        Self { context }
    }
}
