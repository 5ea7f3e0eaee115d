//! Per-item batch errors

use rulefn_engine::EngineError;
use thiserror::Error;

/// Why a batch item has no value
#[derive(Debug, Error)]
pub enum BatchError {
    /// The engine returned an error for this item
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The batch deadline passed before the item finished
    #[error("batch deadline passed before the item completed")]
    TimedOut,

    /// The segment running this item panicked before reaching it
    #[error("segment panicked: {0}")]
    Panicked(String),
}

impl BatchError {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, BatchError::TimedOut)
    }

    /// Engine error carried by this item, if any
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            BatchError::Engine(err) => Some(err),
            _ => None,
        }
    }
}
