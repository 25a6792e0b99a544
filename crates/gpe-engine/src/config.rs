// config.rs — Engine configuration.
//
// EngineConfig carries the host-tunable knobs: the event-log window and
// the system base currency used as a fallback during finance-bridge
// currency resolution. Hosts either construct it in code or load it from
// a TOML file (`engine.toml`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default size of the per-goal event window.
pub const DEFAULT_EVENT_WINDOW: usize = 240;

/// Configuration for a [`crate::GoalProgressEngine`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum retained events per goal (oldest evicted first).
    #[serde(default = "default_event_window")]
    pub event_window: usize,

    /// System base currency, used when neither the caller, the resolved
    /// budget, nor the goal declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_currency: Option<String>,
}

fn default_event_window() -> usize {
    DEFAULT_EVENT_WINDOW
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_window: DEFAULT_EVENT_WINDOW,
            base_currency: None,
        }
    }
}

impl EngineConfig {
    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EngineError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_uses_240_window() {
        let config = EngineConfig::default();
        assert_eq!(config.event_window, 240);
        assert!(config.base_currency.is_none());
    }

    #[test]
    fn load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "event_window = 100\nbase_currency = \"UZS\"").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.event_window, 100);
        assert_eq!(config.base_currency.as_deref(), Some("UZS"));
    }

    #[test]
    fn load_with_missing_fields_falls_back_to_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.event_window, 240);
    }

    #[test]
    fn load_missing_file_returns_io_error() {
        let result = EngineConfig::load("/nonexistent/engine.toml");
        assert!(matches!(result, Err(EngineError::IoError { .. })));
    }
}
