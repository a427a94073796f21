//! Append-only record of a session's executions.

use serde::{Deserialize, Serialize};

use crate::IndexOutOfRange;

/// One successful execution: the result and the input text it ran against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution<R> {
    /// Input text at the time of the run.
    pub input: String,
    /// Value the engine returned.
    pub result: R,
}

/// Ordered execution results, indexed `0..len` in the order they were produced.
///
/// Entries are never reordered or mutated in place. [`clear`](Self::clear) is
/// the only way to remove them and it drops all of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHistory<R> {
    entries: Vec<Execution<R>>,
}

impl<R> ExecutionHistory<R> {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends an execution and returns its index.
    pub fn push(&mut self, input: String, result: R) -> usize {
        let index = self.entries.len();
        self.entries.push(Execution { input, result });
        index
    }

    /// Returns the execution at `index`.
    pub fn get(&self, index: usize) -> Result<&Execution<R>, IndexOutOfRange> {
        self.entries.get(index).ok_or(IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    /// Returns the most recent execution, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Execution<R>> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates executions oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Execution<R>> {
        self.entries.iter()
    }

    /// Drops every entry at once and returns how many were removed.
    ///
    /// The backing vector is swapped for an empty one, so there is no state in
    /// which only part of the history is gone.
    pub fn clear(&mut self) -> usize {
        std::mem::take(&mut self.entries).len()
    }
}

impl<R> Default for ExecutionHistory<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R> IntoIterator for &'a ExecutionHistory<R> {
    type Item = &'a Execution<R>;
    type IntoIter = std::slice::Iter<'a, Execution<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
