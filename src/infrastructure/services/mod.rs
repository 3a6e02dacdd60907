//! Infrastructure services

mod fair_context;

pub use fair_context::{ActiveBackend, FairContext};

#[cfg(test)]
pub use fair_context::mock;
