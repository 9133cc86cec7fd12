//! Error types for pipeline management

use thiserror::Error;
use zamp_core::BusError;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No adjacent pair of segments brackets the requested weighting
    ///
    /// A constructed pipeline always has sentinels at 0 and 100, so this
    /// only happens before construction or once a failed splice could not
    /// restore the host graph.
    #[error("Could not find position in audio pipeline for weighting {weighting} ({segments} segments)")]
    PipelineCorrupted { weighting: u8, segments: usize },

    /// Weighting outside 0..=100
    #[error("Weighting out of range: {0} (expected 0-100)")]
    WeightingOutOfRange(u8),

    /// Host audio graph rejected an operation
    #[error("Audio graph error: {0}")]
    Graph(String),

    /// Event bus error
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl PipelineError {
    /// Create a graph error
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph(message.into())
    }
}

impl From<PipelineError> for BusError {
    /// Carry a pipeline failure across the bus
    ///
    /// Bus errors that were wrapped on the way in are unwrapped rather than
    /// nested a second time.
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Bus(inner) => inner,
            other => BusError::listener(other),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
