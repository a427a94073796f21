use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of the session a [`SessionManager`](crate::SessionManager) creates by default.
pub const DEFAULT_SESSION_NAME: &str = "main";

/// Settings for a [`SessionManager`](crate::SessionManager).
///
/// Build it in code with the chained setters, or load it from JSON with
/// [`from_json`](Self::from_json); missing JSON fields keep their defaults.
///
/// ```
/// use scriptpad::ManagerConfig;
///
/// let config = ManagerConfig::from_json(r#"{ "default_session": "scratch" }"#).unwrap();
/// assert_eq!(config.default_session, "scratch");
/// assert!(config.storage_dir.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Name of the session that always exists and is used when callers pass `None`.
    pub default_session: String,
    /// Directory for saved session snapshots. `None` disables persistence.
    pub storage_dir: Option<PathBuf>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_session: DEFAULT_SESSION_NAME.to_owned(),
            storage_dir: None,
        }
    }
}

impl ManagerConfig {
    /// Creates the default configuration: a `"main"` session and no storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name of the default session.
    #[must_use]
    pub fn default_session(mut self, name: impl Into<String>) -> Self {
        self.default_session = name.into();
        self
    }

    /// Sets the snapshot storage directory.
    #[must_use]
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
