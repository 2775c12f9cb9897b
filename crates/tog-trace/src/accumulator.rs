//! Trace accumulator
//!
//! Folds the ordered step stream of one prompt/response cycle into:
//! - the append-only [`Trace`] log, and
//! - a display-oriented history where consecutive in-progress steps collapse
//!   into a single trailing "thinking" entry.
//!
//! The accumulator owns the trace for the lifetime of one cycle; derived
//! views never mutate it.

use crate::error::TraceError;
use crate::step::{Instruction, Step};
use serde::{Deserialize, Serialize};

/// Ordered, append-only log of steps for one prompt/response cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    steps: Vec<Step>,
}

impl Trace {
    /// Create an empty trace
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps accumulated so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps were accumulated yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All accumulated steps, in arrival order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Most recently appended step
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }
}

/// One displayable entry of the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryEntry {
    /// A plain chat bubble (the user's prompt or the final answer)
    Chat {
        /// Whether the text came from the user
        is_user: bool,
        /// Message text
        text: String,
    },
    /// A transport failure notice
    Error {
        /// Diagnostic message
        text: String,
    },
    /// The in-progress reasoning, summarizable from the trace snapshot
    Thinking {
        /// Snapshot of the trace at the time of the last update
        trace: Trace,
    },
}

impl HistoryEntry {
    /// Whether this is a thinking entry
    #[inline]
    #[must_use]
    pub fn is_thinking(&self) -> bool {
        matches!(self, Self::Thinking { .. })
    }
}

/// Accumulates steps of one cycle and maintains the derived history
///
/// Invariants upheld:
/// - at most one `Thinking` entry exists among the most recent entries, and
///   every trace update replaces it instead of appending another;
/// - once the cycle completed (`final` step or transport error), appends are
///   rejected until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct TraceAccumulator {
    trace: Trace,
    history: Vec<HistoryEntry>,
    complete: bool,
}

impl TraceAccumulator {
    /// Create an empty accumulator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear trace and history for a new prompt cycle
    pub fn reset(&mut self) {
        tracing::debug!(steps = self.trace.len(), "resetting trace");
        self.trace = Trace::new();
        self.history.clear();
        self.complete = false;
    }

    /// Record the user's own prompt as a leading chat entry
    pub fn push_prompt(&mut self, text: impl Into<String>) {
        self.history.push(HistoryEntry::Chat {
            is_user: true,
            text: text.into(),
        });
    }

    /// Append one decoded step and update the derived history
    ///
    /// A step identical to the most recently appended one is a silent no-op.
    ///
    /// # Errors
    /// [`TraceError::CycleComplete`] when the cycle already ended; the caller
    /// must `reset()` first.
    pub fn append(&mut self, step: Step) -> Result<(), TraceError> {
        if self.complete {
            return Err(TraceError::CycleComplete);
        }
        if self.trace.last() == Some(&step) {
            tracing::debug!("dropping duplicate step");
            return Ok(());
        }

        let is_final = step.instruction == Instruction::Final;
        let answer = step.as_final().map(|result| result.user_answer.clone());
        self.trace.steps.push(step);

        // Replace the trailing thinking entry rather than appending another
        if self.history.last().is_some_and(HistoryEntry::is_thinking) {
            self.history.pop();
        }
        self.history.push(HistoryEntry::Thinking {
            trace: self.trace.clone(),
        });

        if is_final {
            self.history.push(HistoryEntry::Chat {
                is_user: false,
                text: answer.unwrap_or_default(),
            });
            self.complete = true;
        }
        Ok(())
    }

    /// Record a transport error and end the cycle
    ///
    /// The trace is left untouched; already-derived views stay visible.
    pub fn on_error(&mut self, message: impl Into<String>) {
        let text = message.into();
        tracing::warn!(error = %text, "transport error ends the cycle");
        self.history.push(HistoryEntry::Error { text });
        self.complete = true;
    }

    /// The accumulated trace
    #[inline]
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// The derived display history
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Whether the cycle ended (`final` step or transport error)
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
