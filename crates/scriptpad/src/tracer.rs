//! Session event hooks.
//!
//! A [`ScriptSession`](crate::ScriptSession) is parameterized over a
//! [`SessionTracer`] and calls into it at each state transition: edits,
//! compile attempts, executions and history clears. The default
//! [`NoopTracer`] has only empty methods, so sessions that do not trace pay
//! nothing for it.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | No-op (default) |
//! | [`LogTracer`] | Structured events through the `tracing` crate |
//! | [`RecordingTracer`] | In-memory event list for tests and post-mortem |
//!
//! ```
//! use scriptpad::{Engine, RecordingTracer, ScriptSession, TraceEvent};
//!
//! struct Echo;
//!
//! impl Engine for Echo {
//!     type Program = String;
//!     type Output = String;
//!     type CompileError = String;
//!     type RuntimeError = String;
//!
//!     fn compile(&mut self, source: &str) -> Result<String, String> {
//!         Ok(source.to_owned())
//!     }
//!
//!     fn execute(&mut self, program: &String, input: &str) -> Result<String, String> {
//!         Ok(format!("{program}{input}"))
//!     }
//! }
//!
//! let mut session = ScriptSession::with_tracer("main", "hi ", Echo, RecordingTracer::new());
//! session.set_input("there");
//! session.compile();
//! session.execute();
//! assert_eq!(session.tracer().event_count(), 3);
//! assert!(matches!(session.tracer().events()[0], TraceEvent::Edit { .. }));
//! ```

use std::fmt;

/// Which editable text field changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Source,
    Input,
}

/// What a `compile()` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The engine produced a new program.
    Compiled,
    /// A program for the current source already existed; the engine was not called.
    Reused,
    /// The engine rejected the source.
    Failed,
}

/// What an `execute()` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// A result was appended to history at `index`.
    Appended {
        /// History index of the new entry.
        index: usize,
    },
    /// The engine reported a runtime error.
    Failed,
    /// There was no compiled program to run.
    NotCompiled,
}

/// Trace event recorded by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Source or input text was replaced.
    Edit {
        /// Field that was replaced.
        field: EditField,
        /// Length in bytes of the new text.
        len: usize,
        /// Whether a compiled program was discarded by this edit.
        invalidated: bool,
    },
    /// A compile attempt finished.
    Compile(CompileOutcome),
    /// An execute attempt finished.
    Execute(ExecuteOutcome),
    /// History was cleared.
    Clear {
        /// Number of entries removed.
        removed: usize,
    },
}

/// Hook points called by a session at each state transition.
///
/// All methods have empty default bodies; implementors override only what
/// they care about. `session` is the session's name.
pub trait SessionTracer: fmt::Debug {
    /// Called after source or input text is replaced.
    fn on_edit(&mut self, _session: &str, _field: EditField, _len: usize, _invalidated: bool) {}

    /// Called after every `compile()` call.
    fn on_compile(&mut self, _session: &str, _outcome: CompileOutcome) {}

    /// Called after every `execute()` call.
    fn on_execute(&mut self, _session: &str, _outcome: ExecuteOutcome) {}

    /// Called after `clear_executions()`.
    fn on_clear(&mut self, _session: &str, _removed: usize) {}
}

/// Tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl SessionTracer for NoopTracer {}

/// Tracer that forwards session events to the `tracing` crate.
///
/// Successful transitions are logged at `debug`, failures at `warn`. Every
/// event carries the session name in the `session` field; install any
/// `tracing` subscriber to collect them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl SessionTracer for LogTracer {
    fn on_edit(&mut self, session: &str, field: EditField, len: usize, invalidated: bool) {
        tracing::debug!(session, ?field, len, invalidated, "text replaced");
    }

    fn on_compile(&mut self, session: &str, outcome: CompileOutcome) {
        match outcome {
            CompileOutcome::Failed => tracing::warn!(session, "compile failed"),
            CompileOutcome::Compiled => tracing::debug!(session, "compiled"),
            CompileOutcome::Reused => tracing::debug!(session, "compile skipped, program is current"),
        }
    }

    fn on_execute(&mut self, session: &str, outcome: ExecuteOutcome) {
        match outcome {
            ExecuteOutcome::Appended { index } => tracing::debug!(session, index, "executed"),
            ExecuteOutcome::Failed => tracing::warn!(session, "execution failed"),
            ExecuteOutcome::NotCompiled => tracing::warn!(session, "execute called without a compiled program"),
        }
    }

    fn on_clear(&mut self, session: &str, removed: usize) {
        tracing::debug!(session, removed, "history cleared");
    }
}

/// Tracer that records every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    /// All recorded events in chronological order.
    events: Vec<TraceEvent>,
    /// Optional limit on number of events recorded.
    limit: Option<usize>,
}

impl RecordingTracer {
    /// Creates a new recording tracer with no event limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn record(&mut self, event: TraceEvent) {
        if self.limit.is_some_and(|limit| self.events.len() >= limit) {
            return;
        }
        self.events.push(event);
    }
}

impl SessionTracer for RecordingTracer {
    fn on_edit(&mut self, _session: &str, field: EditField, len: usize, invalidated: bool) {
        self.record(TraceEvent::Edit {
            field,
            len,
            invalidated,
        });
    }

    fn on_compile(&mut self, _session: &str, outcome: CompileOutcome) {
        self.record(TraceEvent::Compile(outcome));
    }

    fn on_execute(&mut self, _session: &str, outcome: ExecuteOutcome) {
        self.record(TraceEvent::Execute(outcome));
    }

    fn on_clear(&mut self, _session: &str, removed: usize) {
        self.record(TraceEvent::Clear { removed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_tracer_respects_limit() {
        let mut tracer = RecordingTracer::with_limit(2);
        tracer.on_clear("main", 0);
        tracer.on_clear("main", 1);
        tracer.on_clear("main", 2);
        assert_eq!(tracer.event_count(), 2);
        assert_eq!(tracer.events()[1], TraceEvent::Clear { removed: 1 });
    }
}
