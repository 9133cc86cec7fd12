//! Channels partition the event space so that independent player instances
//! on one page never observe each other's events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical partition of the event space
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    /// Name of the channel every component joins unless told otherwise
    pub const DEFAULT: &'static str = "Default";

    /// Create a channel with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Channel name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
