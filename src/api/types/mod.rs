//! Request/response types for the HTTP API

pub mod error;
pub mod json;
pub mod query;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use query::{
    BackendInfo, ClassifyRequest, ClassifyResponse, EvaluateRequest, MetricsSummary,
    ModelsResponse, QueryRequest, QueryResponse, ReconfigureRequest, ReconfigureResponse,
};
