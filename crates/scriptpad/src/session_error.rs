use std::fmt;

/// Error held in a session's error slot, separating failures by stage.
///
/// Keeping compile/runtime/not-compiled failures distinct lets the presentation
/// layer pick a message and a recovery hint without string matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError<C, R> {
    /// The engine rejected the source text.
    Compile(C),
    /// The engine failed while running the compiled program.
    Runtime(R),
    /// `execute` was called with no compiled program for the current source.
    NotCompiled,
}

/// Pipeline stage a [`ScriptError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStage {
    Compile,
    Runtime,
    NotCompiled,
}

impl<C, R> ScriptError<C, R> {
    /// Returns the stage this error was raised in.
    #[must_use]
    pub fn stage(&self) -> ErrorStage {
        match self {
            Self::Compile(_) => ErrorStage::Compile,
            Self::Runtime(_) => ErrorStage::Runtime,
            Self::NotCompiled => ErrorStage::NotCompiled,
        }
    }

    #[must_use]
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }

    #[must_use]
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }

    #[must_use]
    pub fn is_not_compiled(&self) -> bool {
        matches!(self, Self::NotCompiled)
    }
}

impl<C: fmt::Display, R: fmt::Display> fmt::Display for ScriptError<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(error) => write!(f, "compile error: {error}"),
            Self::Runtime(error) => write!(f, "runtime error: {error}"),
            Self::NotCompiled => f.write_str("not compiled: call compile before execute"),
        }
    }
}

impl<C, R> std::error::Error for ScriptError<C, R>
where
    C: fmt::Debug + fmt::Display,
    R: fmt::Debug + fmt::Display,
{
}

impl fmt::Display for ErrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::NotCompiled => "not-compiled",
        })
    }
}

/// A history lookup used an index outside `0..len`.
///
/// Returned by the accessor itself rather than stored in the session's error
/// slot: it signals a stale index on the caller's side, not a script fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfRange {
    /// The index that was requested.
    pub index: usize,
    /// History length at the time of the lookup.
    pub len: usize,
}

impl fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            write!(f, "execution index {} out of range: history is empty", self.index)
        } else {
            write!(
                f,
                "execution index {} out of range: valid indices are 0..{}",
                self.index, self.len
            )
        }
    }
}

impl std::error::Error for IndexOutOfRange {}
