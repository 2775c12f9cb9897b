//! Prompt-cycle driver
//!
//! Owns one [`TraceAccumulator`] and consumes the ordered stream of one
//! prompt/response cycle. After every accepted step the graph projection is
//! recomputed and the observer receives a fresh snapshot. Submitting a new
//! prompt resets all per-cycle state; the transport layer is responsible for
//! cancelling any in-flight stream before that.

use crate::config::SessionConfig;
use crate::error::SessionError;
use tog_graph::{project, KnowledgeGraph};
use tog_trace::{decode_record, Decoded, HistoryEntry, Role, TraceAccumulator};
use tokio::sync::mpsc;

/// One event delivered by the streaming transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Raw payload of one streamed record (JSON or the end sentinel)
    Record(String),
    /// Stream-level failure with a diagnostic message
    Error(String),
}

/// Consistent view of the current cycle's derived state
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Display-oriented conversation history
    pub history: Vec<HistoryEntry>,
    /// Knowledge graph with highlight state
    pub graph: KnowledgeGraph,
}

/// Drives one reasoning cycle at a time over a streamed trace
#[derive(Debug, Default)]
pub struct Session {
    config: SessionConfig,
    accumulator: TraceAccumulator,
    graph: KnowledgeGraph,
}

impl Session {
    /// Create a session with the given settings
    #[inline]
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            accumulator: TraceAccumulator::new(),
            graph: KnowledgeGraph::default(),
        }
    }

    /// Current settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current derived state
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            history: self.accumulator.history().to_vec(),
            graph: self.graph.clone(),
        }
    }

    /// Display history of the current cycle
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        self.accumulator.history()
    }

    /// Graph projection of the current cycle
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    /// Submit a prompt and consume its event stream to completion
    ///
    /// Resets all per-cycle state, records the prompt as the leading chat
    /// entry, then folds incoming records one at a time. Undecodable records
    /// are skipped; a transport error ends the cycle with a single error
    /// entry while already-derived state stays visible. The observer is
    /// invoked with a fresh [`Snapshot`] after every state change.
    ///
    /// # Errors
    /// [`SessionError::EmptyPrompt`] when the prompt is empty or whitespace.
    pub async fn run_prompt(
        &mut self,
        prompt: &str,
        mut events: mpsc::Receiver<StreamEvent>,
        mut observe: impl FnMut(Snapshot),
    ) -> Result<(), SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        tracing::info!(
            provider = ?self.config.agent_provider,
            model = %self.config.model,
            "starting prompt cycle"
        );
        self.accumulator.reset();
        self.graph = KnowledgeGraph::default();
        self.accumulator.push_prompt(prompt);
        observe(self.snapshot());

        while let Some(event) = events.recv().await {
            match event {
                StreamEvent::Record(raw) => {
                    if !self.ingest_record(&raw, &mut observe) {
                        break;
                    }
                }
                StreamEvent::Error(message) => {
                    self.accumulator.on_error(message);
                    observe(self.snapshot());
                    break;
                }
            }
        }

        tracing::info!(steps = self.accumulator.trace().len(), "prompt cycle ended");
        Ok(())
    }

    /// Fold one raw record; returns false when the cycle is over
    fn ingest_record(&mut self, raw: &str, observe: &mut impl FnMut(Snapshot)) -> bool {
        match decode_record(raw) {
            Ok(Decoded::Step(step)) => {
                if self.accumulator.append(step).is_err() {
                    // Stream kept sending after the cycle ended
                    tracing::warn!("record after cycle completion dropped");
                    return false;
                }
                self.graph = project(self.accumulator.trace());
                observe(self.snapshot());
                !self.accumulator.is_complete()
            }
            Ok(Decoded::Done) => {
                tracing::debug!("stream finished");
                false
            }
            Err(err) => {
                // Skip-and-continue keeps one bad record from breaking the cycle
                tracing::debug!(error = %err, "skipping undecodable record");
                true
            }
        }
    }

    /// Hallucinated selections in the current trace
    ///
    /// Pairs each assistant selection step with the user step immediately
    /// before it and returns `(step index, flagged selection indices)` for
    /// every selection that names candidates it was never offered. An
    /// annotation for display, not an error.
    #[must_use]
    pub fn hallucinated_selections(&self) -> Vec<(usize, Vec<usize>)> {
        let steps = self.accumulator.trace().steps();
        steps
            .windows(2)
            .enumerate()
            .filter_map(|(index, pair)| {
                let (offer, selection) = (&pair[0], &pair[1]);
                if selection.role != Role::Assistant || !selection.instruction.is_selection() {
                    return None;
                }
                let flags = tog_graph::hallucinated_selections(offer, selection);
                (!flags.is_empty()).then_some((index + 1, flags))
            })
            .collect()
    }
}
