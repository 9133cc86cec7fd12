//! Host audio graph
//!
//! The pipeline never processes samples itself. It only rewires nodes that
//! belong to a host graph (Web Audio in the browser, [`crate::recording`]
//! everywhere else) through these two traits.

use crate::error::Result;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Handle to a node in the host audio graph
///
/// Connections are directed: audio flows from `self` into `destination`.
pub trait AudioNode: Any + fmt::Debug {
    /// Route this node's output into `destination`
    fn connect(&self, destination: &dyn AudioNode) -> Result<()>;

    /// Remove the route from this node into `destination`
    ///
    /// Fails if no such route exists.
    fn disconnect(&self, destination: &dyn AudioNode) -> Result<()>;

    /// Get a reference to self as Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Shared node handle
pub type NodeHandle = Rc<dyn AudioNode>;

/// Host processing context (the owner of the final output node)
pub trait ProcessingContext: Any + fmt::Debug {
    /// Final output node of the graph
    fn destination(&self) -> NodeHandle;

    /// Whether the context is currently producing audio
    fn is_running(&self) -> bool;

    /// Ask a suspended context to start producing audio
    fn resume(&self) -> Result<()>;

    /// Get a reference to self as Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Shared context handle
pub type ContextHandle = Rc<dyn ProcessingContext>;
