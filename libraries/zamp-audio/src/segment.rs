//! Pipeline segments
//!
//! A segment is a contiguous run of host nodes (often just one) together
//! with a weighting that decides where it sits in the pipeline. Lower
//! weightings sit closer to the media source, higher ones closer to the
//! output.

use crate::error::{PipelineError, Result};
use crate::graph::NodeHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Position hint for a segment, 0 (source) to 100 (output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weighting(u8);

impl Weighting {
    /// Highest valid weighting
    pub const MAX: u8 = 100;

    /// Media source sentinel
    pub const SOURCE: Self = Self(0);

    /// Output sentinel
    pub const DESTINATION: Self = Self(100);

    /// Weighting used when a segment does not ask for one
    pub const DEFAULT: Self = Self(50);

    /// Equalizer filter chain, near the source
    pub const EQUALIZER: Self = Self(10);

    /// Visualiser analyser, just before the output
    pub const VISUALISER: Self = Self(99);

    /// Create a weighting
    ///
    /// # Errors
    /// `WeightingOutOfRange` if `value` is above 100.
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(PipelineError::WeightingOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Raw value
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Weighting {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Weighting {
    type Error = PipelineError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Weighting> for u8 {
    fn from(weighting: Weighting) -> Self {
        weighting.0
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Contiguous run of host nodes placed as a unit
///
/// Audio enters at `first_node` and leaves at `last_node`. Internal wiring
/// between the two is the contributor's business. Segments are immutable
/// once created.
#[derive(Clone)]
pub struct PipelineSegment {
    first_node: NodeHandle,
    last_node: NodeHandle,
    weighting: Weighting,
}

impl PipelineSegment {
    /// Create a segment spanning `first_node` to `last_node`
    pub fn new(first_node: NodeHandle, last_node: NodeHandle, weighting: Weighting) -> Self {
        Self {
            first_node,
            last_node,
            weighting,
        }
    }

    /// Create a segment of one node
    pub fn single(node: NodeHandle, weighting: Weighting) -> Self {
        Self {
            first_node: Rc::clone(&node),
            last_node: node,
            weighting,
        }
    }

    /// Node audio enters through
    pub fn first_node(&self) -> &NodeHandle {
        &self.first_node
    }

    /// Node audio leaves through
    pub fn last_node(&self) -> &NodeHandle {
        &self.last_node
    }

    /// Position in the pipeline, 0 (source) to 100 (output)
    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Check if the segment is a single node
    pub fn is_single(&self) -> bool {
        Rc::ptr_eq(&self.first_node, &self.last_node)
    }
}

impl fmt::Debug for PipelineSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSegment")
            .field("first_node", &self.first_node)
            .field("last_node", &self.last_node)
            .field("weighting", &self.weighting)
            .finish()
    }
}
