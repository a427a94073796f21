//! The engine boundary consumed by [`ScriptSession`](crate::ScriptSession).
//!
//! Parsing, compilation and execution all live behind this trait. The session
//! never looks inside the associated types, it only threads them through:
//! a compiled program goes from `compile` into `execute`, outputs go into the
//! execution history and errors into the session's error slot.

/// A script engine that turns source text into a program and runs it.
///
/// Both calls are synchronous from the session's point of view. An engine that
/// does its work on another thread must block until it has a definite result.
///
/// Methods take `&mut self` so an engine can keep its own context across calls
/// (symbol tables, registered constants, caches).
pub trait Engine {
    /// Opaque artifact produced by a successful compile.
    type Program;
    /// Value produced by a successful execution.
    type Output;
    /// Failure reported while compiling source text.
    type CompileError;
    /// Failure reported while executing a compiled program.
    type RuntimeError;

    /// Compiles `source` into a program.
    fn compile(&mut self, source: &str) -> Result<Self::Program, Self::CompileError>;

    /// Runs `program` against the given `input` text.
    fn execute(&mut self, program: &Self::Program, input: &str) -> Result<Self::Output, Self::RuntimeError>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    type Program = E::Program;
    type Output = E::Output;
    type CompileError = E::CompileError;
    type RuntimeError = E::RuntimeError;

    fn compile(&mut self, source: &str) -> Result<Self::Program, Self::CompileError> {
        (**self).compile(source)
    }

    fn execute(&mut self, program: &Self::Program, input: &str) -> Result<Self::Output, Self::RuntimeError> {
        (**self).execute(program, input)
    }
}

/// The error type a session stores for engine `E`.
pub type EngineError<E> = crate::ScriptError<<E as Engine>::CompileError, <E as Engine>::RuntimeError>;
