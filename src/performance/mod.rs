pub mod lifecycle;
pub mod price_math;
pub mod stats;

pub use lifecycle::ExitFields;
pub use stats::{compute_stats, PerformanceStats};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerformanceError {
    #[error("{0}")]
    Validation(String),

    #[error("trade {id} not found")]
    NotFound { id: i64 },

    #[error("trade {id} is already closed")]
    Conflict { id: i64 },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
