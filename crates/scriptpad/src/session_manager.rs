//! Registry of named script sessions.
//!
//! `SessionManager` owns several [`ScriptSession`]s keyed by name and provides
//! lifecycle operations (create, destroy, list, fork) and on-disk persistence.
//! A default session always exists and is used when callers pass `None` as the
//! session name, so a single-editor host can ignore names entirely.
//!
//! Each session gets its own clone of the manager's prototype engine.

use std::{collections::HashMap, fmt, fs, path::PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    DEFAULT_SESSION_NAME, Engine, IndexOutOfRange, ManagerConfig, ScriptSession, SessionSnapshot, Stage,
    tracer::{NoopTracer, SessionTracer},
};

/// File extension of saved snapshots.
const SNAPSHOT_EXTENSION: &str = "bin";

// =============================================================================
// Error types
// =============================================================================

/// Errors from session management operations.
///
/// Script failures never show up here; they stay in each session's error slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// The requested session or snapshot was not found.
    NotFound(String),
    /// A session with the given name already exists.
    AlreadyExists(String),
    /// The operation is invalid in the current state (e.g. destroying the default session).
    InvalidState(String),
    /// An argument was invalid (e.g. empty session name, bad snapshot name).
    InvalidArgument(String),
    /// Persistence is not configured, or a filesystem/encoding step failed.
    Storage(String),
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::AlreadyExists(msg) => write!(f, "already exists: {msg}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for ManagerError {}

impl From<IndexOutOfRange> for ManagerError {
    fn from(err: IndexOutOfRange) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

// =============================================================================
// Output types
// =============================================================================

/// Summary of one session, as returned by `list_sessions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub name: String,
    pub stage: Stage,
    pub execution_count: usize,
    /// Whether the session's error slot is set.
    pub has_error: bool,
}

/// Result of a save operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    /// The snapshot name used for the save.
    pub name: String,
    /// Size of the saved snapshot in bytes.
    pub size_bytes: usize,
}

/// A saved snapshot on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSessionInfo {
    /// Snapshot name (filename without extension).
    pub name: String,
    /// Size of the snapshot file in bytes.
    pub size_bytes: u64,
}

// =============================================================================
// SessionManager
// =============================================================================

/// Registry of named [`ScriptSession`]s sharing one engine prototype.
///
/// # Example
///
/// ```
/// use scriptpad::{Engine, SessionManager};
///
/// #[derive(Clone)]
/// struct Upper;
///
/// impl Engine for Upper {
///     type Program = String;
///     type Output = String;
///     type CompileError = String;
///     type RuntimeError = String;
///
///     fn compile(&mut self, source: &str) -> Result<String, String> {
///         Ok(source.to_uppercase())
///     }
///
///     fn execute(&mut self, program: &String, input: &str) -> Result<String, String> {
///         Ok(format!("{program} {input}"))
///     }
/// }
///
/// let mut mgr = SessionManager::new(Upper);
/// mgr.create_session("notes", "hello").unwrap();
/// let session = mgr.session_mut(Some("notes")).unwrap();
/// session.set_input("world");
/// assert_eq!(session.run().unwrap(), "HELLO world");
/// assert_eq!(mgr.list_sessions().len(), 2);
/// ```
pub struct SessionManager<E: Engine + Clone, T: SessionTracer + Default = NoopTracer> {
    /// Sessions keyed by name; each key equals its session's `name()`.
    sessions: HashMap<String, ScriptSession<E, T>>,
    /// Name used when no session name is provided.
    default_session: String,
    /// Engine cloned into every new session.
    engine: E,
    /// Directory for saved sessions (None = persistence disabled).
    storage_dir: Option<PathBuf>,
}

impl<E: Engine + Clone> SessionManager<E> {
    /// Creates a manager with the default configuration: one empty `"main"`
    /// session and no persistence.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, ManagerConfig::default())
    }
}

impl<E: Engine + Clone, T: SessionTracer + Default> SessionManager<E, T> {
    /// Creates a manager from `config`, with its default session already present.
    ///
    /// A blank configured default name falls back to [`DEFAULT_SESSION_NAME`].
    #[must_use]
    pub fn with_config(engine: E, config: ManagerConfig) -> Self {
        let default_session = if validate_session_name(&config.default_session).is_ok() {
            config.default_session
        } else {
            tracing::warn!(
                configured = %config.default_session,
                fallback = DEFAULT_SESSION_NAME,
                "blank default session name in config"
            );
            DEFAULT_SESSION_NAME.to_owned()
        };
        let mut mgr = Self {
            sessions: HashMap::new(),
            default_session,
            engine,
            storage_dir: None,
        };
        if let Some(dir) = config.storage_dir {
            mgr.set_storage_dir(dir);
        }
        let default = mgr.build_session(mgr.default_session.clone(), String::new());
        mgr.sessions.insert(mgr.default_session.clone(), default);
        mgr
    }

    /// Configures the directory for session persistence.
    ///
    /// The directory is created if it does not exist.
    pub fn set_storage_dir(&mut self, dir: PathBuf) {
        let _ = fs::create_dir_all(&dir);
        self.storage_dir = Some(dir);
    }

    #[must_use]
    pub fn default_session_name(&self) -> &str {
        &self.default_session
    }

    /// The engine prototype new sessions are cloned from.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

// =============================================================================
// Session lifecycle
// =============================================================================

impl<E: Engine + Clone, T: SessionTracer + Default> SessionManager<E, T> {
    /// Creates a new `Fresh` session with the given source text.
    pub fn create_session(&mut self, name: &str, source: &str) -> Result<(), ManagerError> {
        validate_session_name(name)?;
        if self.sessions.contains_key(name) {
            return Err(ManagerError::AlreadyExists(format!("session '{name}' already exists")));
        }
        let session = self.build_session(name.to_owned(), source.to_owned());
        self.sessions.insert(name.to_owned(), session);
        tracing::debug!(session = name, "session created");
        Ok(())
    }

    /// Destroys a named session. The default session cannot be destroyed.
    pub fn destroy_session(&mut self, name: &str) -> Result<(), ManagerError> {
        if name == self.default_session {
            return Err(ManagerError::InvalidState(format!(
                "cannot destroy the default session '{}'",
                self.default_session
            )));
        }
        if self.sessions.remove(name).is_none() {
            return Err(ManagerError::NotFound(format!("session '{name}' not found")));
        }
        tracing::debug!(session = name, "session destroyed");
        Ok(())
    }

    /// Looks up a session; `None` means the default session.
    pub fn session(&self, name: Option<&str>) -> Result<&ScriptSession<E, T>, ManagerError> {
        let name = self.resolve(name);
        self.sessions
            .get(name)
            .ok_or_else(|| ManagerError::NotFound(format!("session '{name}' not found")))
    }

    /// Looks up a session for editing; `None` means the default session.
    pub fn session_mut(&mut self, name: Option<&str>) -> Result<&mut ScriptSession<E, T>, ManagerError> {
        let name = name.unwrap_or(&self.default_session);
        self.sessions
            .get_mut(name)
            .ok_or_else(|| ManagerError::NotFound(format!("session '{name}' not found")))
    }

    /// Lists all sessions, sorted by name.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .values()
            .map(|session| SessionInfo {
                name: session.name().to_owned(),
                stage: session.stage(),
                execution_count: session.get_execution_count(),
                has_error: session.get_error().is_some(),
            })
            .collect();
        sessions.sort_by(|a, b| a.name.cmp(&b.name));
        sessions
    }

    /// Returns the result at `index` in a session's history; `None` means the
    /// default session.
    pub fn execution_result(&self, name: Option<&str>, index: usize) -> Result<&E::Output, ManagerError> {
        Ok(self.session(name)?.get_execution_result(index)?)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }
}

impl<E, T> SessionManager<E, T>
where
    E: Engine + Clone,
    E::Program: Clone,
    E::Output: Clone,
    E::CompileError: Clone,
    E::RuntimeError: Clone,
    T: SessionTracer + Default,
{
    /// Forks an existing session into a new independent copy named `new_name`.
    pub fn fork_session(&mut self, source: &str, new_name: &str) -> Result<(), ManagerError> {
        validate_session_name(new_name)?;
        if self.sessions.contains_key(new_name) {
            return Err(ManagerError::AlreadyExists(format!("session '{new_name}' already exists")));
        }
        let forked = self
            .sessions
            .get(source)
            .ok_or_else(|| ManagerError::NotFound(format!("session '{source}' not found")))?
            .fork(new_name);
        self.sessions.insert(new_name.to_owned(), forked);
        tracing::debug!(session = source, fork = new_name, "session forked");
        Ok(())
    }
}

// =============================================================================
// Session persistence
// =============================================================================

impl<E: Engine + Clone, T: SessionTracer + Default> SessionManager<E, T>
where
    E::Output: Serialize,
{
    /// Saves a session to `<storage_dir>/<snapshot>.bin`.
    ///
    /// The snapshot name defaults to the session name. It may only contain
    /// ASCII alphanumerics, hyphens and underscores.
    pub fn save_session(&self, name: Option<&str>, snapshot: Option<&str>) -> Result<SaveResult, ManagerError> {
        let storage_dir = self.storage_dir()?;
        let session = self.session(name)?;
        let snapshot_name = snapshot.unwrap_or(session.name()).to_owned();
        validate_snapshot_name(&snapshot_name)?;

        let bytes = session.save().map_err(ManagerError::Storage)?;
        let path = storage_dir.join(format!("{snapshot_name}.{SNAPSHOT_EXTENSION}"));
        fs::write(&path, &bytes).map_err(|e| ManagerError::Storage(format!("failed to write snapshot: {e}")))?;
        tracing::debug!(session = session.name(), snapshot = %snapshot_name, size = bytes.len(), "session saved");

        Ok(SaveResult {
            name: snapshot_name,
            size_bytes: bytes.len(),
        })
    }
}

impl<E: Engine + Clone, T: SessionTracer + Default> SessionManager<E, T>
where
    E::Output: DeserializeOwned,
{
    /// Loads a saved snapshot as a new `Fresh` session and returns its name.
    ///
    /// The session is registered under `name`, or under the name stored in the
    /// snapshot when `name` is `None`.
    pub fn load_session(&mut self, snapshot: &str, name: Option<&str>) -> Result<String, ManagerError> {
        let storage_dir = self.storage_dir()?;
        validate_snapshot_name(snapshot)?;

        let path = storage_dir.join(format!("{snapshot}.{SNAPSHOT_EXTENSION}"));
        let bytes =
            fs::read(&path).map_err(|e| ManagerError::NotFound(format!("snapshot '{snapshot}' not found: {e}")))?;
        let mut decoded = SessionSnapshot::<E::Output>::from_bytes(&bytes).map_err(ManagerError::Storage)?;
        if let Some(name) = name {
            validate_session_name(name)?;
            decoded = decoded.renamed(name);
        }

        let session_name = decoded.name().to_owned();
        if self.sessions.contains_key(&session_name) {
            return Err(ManagerError::AlreadyExists(format!("session '{session_name}' already exists")));
        }
        let session = decoded.into_session(self.engine.clone(), T::default());
        self.sessions.insert(session_name.clone(), session);
        tracing::debug!(session = %session_name, snapshot, "session loaded");
        Ok(session_name)
    }
}

impl<E: Engine + Clone, T: SessionTracer + Default> SessionManager<E, T> {
    /// Lists saved snapshots in the storage directory, sorted by name.
    pub fn list_saved_sessions(&self) -> Result<Vec<SavedSessionInfo>, ManagerError> {
        let storage_dir = self.storage_dir()?;

        let mut saved = Vec::new();
        if storage_dir.exists() {
            let entries = fs::read_dir(storage_dir)
                .map_err(|e| ManagerError::Storage(format!("failed to read storage dir: {e}")))?;
            for entry in entries {
                let entry = entry.map_err(|e| ManagerError::Storage(format!("dir entry error: {e}")))?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some(SNAPSHOT_EXTENSION)
                    && let Some(name) = path.file_stem().and_then(|s| s.to_str())
                {
                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    saved.push(SavedSessionInfo {
                        name: name.to_owned(),
                        size_bytes: size,
                    });
                }
            }
        }
        saved.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(saved)
    }
}

// =============================================================================
// Private helpers
// =============================================================================

impl<E: Engine + Clone, T: SessionTracer + Default> SessionManager<E, T> {
    fn build_session(&self, name: String, source: String) -> ScriptSession<E, T> {
        ScriptSession::with_tracer(name, source, self.engine.clone(), T::default())
    }

    fn resolve<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.unwrap_or(&self.default_session)
    }

    fn storage_dir(&self) -> Result<&PathBuf, ManagerError> {
        self.storage_dir
            .as_ref()
            .ok_or_else(|| ManagerError::Storage("storage not configured".to_owned()))
    }
}

fn validate_session_name(name: &str) -> Result<(), ManagerError> {
    if name.trim().is_empty() {
        return Err(ManagerError::InvalidArgument("session name must not be empty".to_owned()));
    }
    Ok(())
}

/// Only alphanumerics, hyphens and underscores, so a snapshot name can never
/// escape the storage directory.
fn validate_snapshot_name(name: &str) -> Result<(), ManagerError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ManagerError::InvalidArgument(format!(
            "invalid snapshot name '{name}': only alphanumeric characters, hyphens, and underscores are allowed"
        )));
    }
    Ok(())
}
