//! tog-session - Prompt-cycle orchestration
//!
//! The caller-facing surface of the trace interpreter. A [`Session`] owns the
//! per-cycle state: submitting a prompt resets it, the stream's events are
//! folded one at a time, and every accepted step yields a fresh
//! `(history, graph)` snapshot through the observer hook.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tog_session::{Session, SessionConfig, StreamEvent};
//!
//! let mut session = Session::new(SessionConfig::default());
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! // transport task feeds tx with StreamEvent::Record / StreamEvent::Error
//! session.run_prompt("who founded the city?", rx, |snapshot| {
//!     render(snapshot);
//! }).await?;
//! ```

pub mod config;
pub mod error;
pub mod session;

pub use config::{AgentProvider, GraphDb, SessionConfig};
pub use error::SessionError;
pub use session::{Session, Snapshot, StreamEvent};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
