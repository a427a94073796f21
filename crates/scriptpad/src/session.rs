use std::{fmt, mem};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Engine, EngineError, Execution, ExecutionHistory, IndexOutOfRange, ScriptError,
    tracer::{CompileOutcome, EditField, ExecuteOutcome, NoopTracer, SessionTracer},
};

/// Compile state of a session, as an explicit sum type.
///
/// `Fresh` means there is no program for the current source text, either
/// because nothing was compiled yet, the last compile failed, or the source was
/// edited since.
#[derive(Debug, Clone, Default)]
pub enum CompileState<P> {
    #[default]
    Fresh,
    /// Compiled and not executed yet.
    Compiled(P),
    /// Compiled and executed at least once.
    Executed(P),
}

impl<P> CompileState<P> {
    /// Returns the compiled program, if there is one.
    #[must_use]
    pub fn program(&self) -> Option<&P> {
        match self {
            Self::Fresh => None,
            Self::Compiled(program) | Self::Executed(program) => Some(program),
        }
    }

    /// Moves `Compiled` to `Executed`; other states are unchanged.
    fn mark_executed(&mut self) {
        *self = match mem::take(self) {
            Self::Compiled(program) | Self::Executed(program) => Self::Executed(program),
            Self::Fresh => Self::Fresh,
        };
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fresh => Stage::Fresh,
            Self::Compiled(_) => Stage::Compiled,
            Self::Executed(_) => Stage::Executed,
        }
    }
}

/// Position of a session in its `Fresh -> Compiled -> Executed` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fresh,
    Compiled,
    Executed,
}

/// Serializable form of a session for persistence.
///
/// The compiled program and the error slot are not part of it: a loaded session
/// is `Fresh`, with the saved source, input and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot<R> {
    name: String,
    source: String,
    input: String,
    history: ExecutionHistory<R>,
}

/// The edit/compile/execute state machine for one script.
///
/// The session owns the source and input text, the compiled program for the
/// current source, the error from the most recent failing operation, and an
/// append-only history of execution results. Parsing and running are delegated
/// to the injected [`Engine`].
///
/// Edits never fail. Engine failures never panic; they land in the error slot
/// read through [`get_error`](Self::get_error). The only failure returned
/// directly is [`IndexOutOfRange`] from the history accessors.
pub struct ScriptSession<E: Engine, T: SessionTracer = NoopTracer> {
    name: String,
    source: String,
    input: String,
    compiled: CompileState<E::Program>,
    last_error: Option<EngineError<E>>,
    history: ExecutionHistory<E::Output>,
    engine: E,
    tracer: T,
}

impl<E: Engine> ScriptSession<E> {
    /// Creates a `Fresh` session with empty input and no tracing.
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<String>, engine: E) -> Self {
        Self::with_tracer(name, source, engine, NoopTracer)
    }
}

impl<E: Engine, T: SessionTracer> ScriptSession<E, T> {
    /// Creates a `Fresh` session that reports its transitions to `tracer`.
    #[must_use]
    pub fn with_tracer(name: impl Into<String>, source: impl Into<String>, engine: E, tracer: T) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            input: String::new(),
            compiled: CompileState::Fresh,
            last_error: None,
            history: ExecutionHistory::new(),
            engine,
            tracer,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the source text and discards any compiled program.
    ///
    /// The error slot and history are left alone.
    pub fn set_source(&mut self, text: impl Into<String>) {
        self.source = text.into();
        let invalidated = self.compiled.program().is_some();
        self.compiled = CompileState::Fresh;
        self.tracer
            .on_edit(&self.name, EditField::Source, self.source.len(), invalidated);
    }

    /// Replaces the input text. Input only affects execution, so the compiled
    /// program stays valid.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.tracer.on_edit(&self.name, EditField::Input, self.input.len(), false);
    }

    /// Compiles the current source if there is no program for it yet.
    ///
    /// With a program already present this is a no-op: the engine is not
    /// called and neither the program nor the error slot changes. Otherwise the
    /// engine's outcome decides: on success the program is stored and the error
    /// cleared, on failure the session goes back to `Fresh` and the compile
    /// error is stored.
    pub fn compile(&mut self) {
        if self.compiled.program().is_some() {
            self.tracer.on_compile(&self.name, CompileOutcome::Reused);
            return;
        }

        match self.engine.compile(&self.source) {
            Ok(program) => {
                self.compiled = CompileState::Compiled(program);
                self.last_error = None;
                self.tracer.on_compile(&self.name, CompileOutcome::Compiled);
            }
            Err(error) => {
                self.compiled = CompileState::Fresh;
                self.last_error = Some(ScriptError::Compile(error));
                self.tracer.on_compile(&self.name, CompileOutcome::Failed);
            }
        }
    }

    /// Runs the compiled program against the current input.
    ///
    /// Without a compiled program this stores [`ScriptError::NotCompiled`] and
    /// returns. On success the result is appended to history and the error slot
    /// cleared; on failure the runtime error is stored and history is unchanged.
    /// Every successful call appends a new entry, even with unchanged input.
    pub fn execute(&mut self) {
        let Some(program) = self.compiled.program() else {
            self.last_error = Some(ScriptError::NotCompiled);
            self.tracer.on_execute(&self.name, ExecuteOutcome::NotCompiled);
            return;
        };

        match self.engine.execute(program, &self.input) {
            Ok(result) => {
                let index = self.history.push(self.input.clone(), result);
                self.compiled.mark_executed();
                self.last_error = None;
                self.tracer.on_execute(&self.name, ExecuteOutcome::Appended { index });
            }
            Err(error) => {
                self.last_error = Some(ScriptError::Runtime(error));
                self.tracer.on_execute(&self.name, ExecuteOutcome::Failed);
            }
        }
    }

    /// Compiles if there is no program yet, then executes, stopping at a
    /// compile failure.
    ///
    /// This is the flow behind an editor's "run" action. An earlier runtime
    /// error does not block it, since `execute` overwrites the error slot. On
    /// success returns the result that was just appended; otherwise the error
    /// now in the error slot.
    pub fn run(&mut self) -> Result<&E::Output, &EngineError<E>> {
        if !self.is_compiled() {
            self.compile();
        }
        if self.is_compiled() {
            self.execute();
        }
        if self.last_error.is_none()
            && let Some(execution) = self.history.last()
        {
            return Ok(&execution.result);
        }
        Err(self.last_error.get_or_insert(ScriptError::NotCompiled))
    }

    /// Returns the error from the most recent failing operation, if it has not
    /// been cleared by a later success.
    #[must_use]
    pub fn get_error(&self) -> Option<&EngineError<E>> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn get_execution_count(&self) -> usize {
        self.history.len()
    }

    /// Returns the result stored at `index` in history.
    pub fn get_execution_result(&self, index: usize) -> Result<&E::Output, IndexOutOfRange> {
        self.history.get(index).map(|execution| &execution.result)
    }

    /// Returns the execution stored at `index`, with the input it ran against.
    pub fn get_execution(&self, index: usize) -> Result<&Execution<E::Output>, IndexOutOfRange> {
        self.history.get(index)
    }

    /// Returns the newest result, if any.
    #[must_use]
    pub fn last_execution_result(&self) -> Option<&E::Output> {
        self.history.last().map(|execution| &execution.result)
    }

    /// Iterates the history oldest first.
    pub fn executions(&self) -> impl Iterator<Item = &Execution<E::Output>> {
        self.history.iter()
    }

    #[must_use]
    pub fn history(&self) -> &ExecutionHistory<E::Output> {
        &self.history
    }

    /// Empties the history in one step. Source, input, compiled program and
    /// error slot are untouched.
    pub fn clear_executions(&mut self) {
        let removed = self.history.clear();
        self.tracer.on_clear(&self.name, removed);
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.compiled.stage()
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.compiled.program().is_some()
    }

    #[must_use]
    pub fn compiled_program(&self) -> Option<&E::Program> {
        self.compiled.program()
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the engine.
    ///
    /// Reconfiguring the engine does not invalidate an existing program; call
    /// [`set_source`](Self::set_source) to force a recompile.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[must_use]
    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut T {
        &mut self.tracer
    }
}

impl<E: Engine, T: SessionTracer> fmt::Debug for ScriptSession<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptSession")
            .field("name", &self.name)
            .field("stage", &self.stage())
            .field("source_len", &self.source.len())
            .field("input_len", &self.input.len())
            .field("has_error", &self.last_error.is_some())
            .field("execution_count", &self.history.len())
            .field("tracer", &self.tracer)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Fork and persistence
// =============================================================================

impl<E, T> ScriptSession<E, T>
where
    E: Engine + Clone,
    E::Program: Clone,
    E::Output: Clone,
    E::CompileError: Clone,
    E::RuntimeError: Clone,
    T: SessionTracer + Default,
{
    /// Creates an independent copy of this session under a new name.
    ///
    /// Source, input, compiled program, error slot and history are cloned; the
    /// fork gets a fresh default tracer. Later changes to either session do
    /// not affect the other.
    #[must_use]
    pub fn fork(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: self.source.clone(),
            input: self.input.clone(),
            compiled: self.compiled.clone(),
            last_error: self.last_error.clone(),
            history: self.history.clone(),
            engine: self.engine.clone(),
            tracer: T::default(),
        }
    }
}

/// Borrowed mirror of [`SessionSnapshot`]; encodes to the same bytes without
/// cloning the history.
#[derive(Serialize)]
struct SnapshotRef<'a, R> {
    name: &'a str,
    source: &'a str,
    input: &'a str,
    history: &'a ExecutionHistory<R>,
}

impl<E: Engine, T: SessionTracer> ScriptSession<E, T>
where
    E::Output: Serialize,
{
    /// Serializes name, source, input and history to postcard bytes.
    ///
    /// The compiled program and the error slot are not saved.
    pub fn save(&self) -> Result<Vec<u8>, String> {
        let snapshot = SnapshotRef {
            name: &self.name,
            source: &self.source,
            input: &self.input,
            history: &self.history,
        };
        postcard::to_allocvec(&snapshot).map_err(|e| format!("session serialization failed: {e}"))
    }
}

impl<E: Engine> ScriptSession<E>
where
    E::Output: DeserializeOwned,
{
    /// Restores a session from bytes produced by [`save`](Self::save).
    ///
    /// The restored session is `Fresh` with an empty error slot; history
    /// indices are the same as when it was saved.
    pub fn load(bytes: &[u8], engine: E) -> Result<Self, String> {
        Self::load_with_tracer(bytes, engine, NoopTracer)
    }
}

impl<E: Engine, T: SessionTracer> ScriptSession<E, T>
where
    E::Output: DeserializeOwned,
{
    /// Like [`ScriptSession::load`], reporting to `tracer`.
    pub fn load_with_tracer(bytes: &[u8], engine: E, tracer: T) -> Result<Self, String> {
        let snapshot = SessionSnapshot::from_bytes(bytes)?;
        Ok(snapshot.into_session(engine, tracer))
    }
}

impl<R: DeserializeOwned> SessionSnapshot<R> {
    /// Decodes a snapshot from postcard bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        postcard::from_bytes(bytes).map_err(|e| format!("session deserialization failed: {e}"))
    }
}

impl<R> SessionSnapshot<R> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn history(&self) -> &ExecutionHistory<R> {
        &self.history
    }

    /// Returns the snapshot with a different session name.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Rebuilds a `Fresh` session around `engine`.
    pub fn into_session<E, T>(self, engine: E, tracer: T) -> ScriptSession<E, T>
    where
        E: Engine<Output = R>,
        T: SessionTracer,
    {
        ScriptSession {
            name: self.name,
            source: self.source,
            input: self.input,
            compiled: CompileState::Fresh,
            last_error: None,
            history: self.history,
            engine,
            tracer,
        }
    }
}
