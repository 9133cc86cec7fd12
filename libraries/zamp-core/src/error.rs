//! Error types for the component event bus

use crate::component::RootId;
use thiserror::Error;

/// Result type alias using `BusError`
pub type Result<T> = std::result::Result<T, BusError>;

/// Boxed error raised by a listener callback
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Event bus errors
///
/// Channel mismatches are not errors: delivery to a component on another
/// channel is silently dropped.
#[derive(Debug, Error)]
pub enum BusError {
    /// No component with the requested name is attached to the root
    #[error("No component found with name '{name}'. Did you forget to register it?")]
    ComponentNotFound { name: String },

    /// Component is already attached to a root
    #[error("Component '{component}' is already attached to root {root}")]
    AlreadyAttached { component: String, root: RootId },

    /// A listener callback failed; the original error is carried unmodified
    #[error(transparent)]
    Listener(ListenerError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BusError {
    /// Wrap an error raised inside a listener
    pub fn listener(err: impl Into<ListenerError>) -> Self {
        Self::Listener(err.into())
    }

    /// Create a not found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::ComponentNotFound { name: name.into() }
    }

    /// Downcast a listener failure back to the concrete error type it was raised with
    pub fn listener_error<T: std::error::Error + 'static>(&self) -> Option<&T> {
        match self {
            Self::Listener(err) => err.downcast_ref::<T>(),
            _ => None,
        }
    }
}
