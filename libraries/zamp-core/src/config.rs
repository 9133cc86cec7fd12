//! Bus configuration

use crate::emitter::DEFAULT_MAX_EVENT_DEPTH;
use crate::error::{BusError, Result};
use crate::Channel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a root and its bus
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BusConfig {
    /// Channel of the root's own emitter (default: "Default")
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Soft limit on nested event dispatch before a warning is logged (default: 64)
    #[serde(default = "default_max_event_depth")]
    pub max_event_depth: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            max_event_depth: default_max_event_depth(),
        }
    }
}

impl BusConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables are prefixed with `ZAMP_`, e.g. `ZAMP_CHANNEL`
    /// and `ZAMP_MAX_EVENT_DEPTH`, and override values from the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ZAMP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| BusError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| BusError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.channel.is_empty() {
            return Err(BusError::Config("channel must not be empty".to_string()));
        }

        if self.max_event_depth == 0 {
            return Err(BusError::Config(
                "max_event_depth must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_channel() -> String {
    Channel::DEFAULT.to_string()
}

fn default_max_event_depth() -> usize {
    DEFAULT_MAX_EVENT_DEPTH
}
