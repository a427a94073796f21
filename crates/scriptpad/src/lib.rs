//! Session lifecycle for interactive script editors.
//!
//! A [`ScriptSession`] sits between an editor surface and a script [`Engine`].
//! The editor pushes source and input edits into the session and triggers
//! compile/execute; the session decides when a compiled program is stale,
//! sequences the engine calls, keeps the most recent error, and records every
//! successful execution in an append-only history.
//!
//! ```
//! use scriptpad::{Engine, ErrorStage, ScriptSession, Stage};
//!
//! /// Sums whitespace-separated integers from the source and the input.
//! struct Sum;
//!
//! impl Engine for Sum {
//!     type Program = i64;
//!     type Output = i64;
//!     type CompileError = String;
//!     type RuntimeError = String;
//!
//!     fn compile(&mut self, source: &str) -> Result<i64, String> {
//!         source
//!             .split_whitespace()
//!             .map(|word| word.parse::<i64>().map_err(|e| format!("{word}: {e}")))
//!             .sum()
//!     }
//!
//!     fn execute(&mut self, program: &i64, input: &str) -> Result<i64, String> {
//!         let extra: i64 = input.trim().parse().unwrap_or(0);
//!         Ok(program + extra)
//!     }
//! }
//!
//! let mut session = ScriptSession::new("main", "1 2 3", Sum);
//! session.compile();
//! assert_eq!(session.stage(), Stage::Compiled);
//! session.set_input("4");
//! session.execute();
//! assert_eq!(session.get_execution_result(0), Ok(&10));
//!
//! session.set_source("1 x");
//! session.execute();
//! assert_eq!(session.get_error().map(|e| e.stage()), Some(ErrorStage::NotCompiled));
//! assert_eq!(session.get_execution_count(), 1);
//! ```

mod config;
mod engine;
mod history;
mod session;
mod session_error;
pub mod session_manager;
pub mod tracer;

pub use crate::{
    config::{DEFAULT_SESSION_NAME, ManagerConfig},
    engine::{Engine, EngineError},
    history::{Execution, ExecutionHistory},
    session::{CompileState, ScriptSession, SessionSnapshot, Stage},
    session_error::{ErrorStage, IndexOutOfRange, ScriptError},
    session_manager::{ManagerError, SessionInfo, SessionManager},
    tracer::{
        CompileOutcome, EditField, ExecuteOutcome, LogTracer, NoopTracer, RecordingTracer, SessionTracer, TraceEvent,
    },
};
