//! tog-trace - Reasoning-trace decoding and accumulation
//!
//! Consumes the raw record stream of a graph-reasoning agent backend and
//! turns it into typed state:
//! - [`decoder`] validates one raw record into a [`Step`] (or the
//!   end-of-stream signal)
//! - [`tabular`] extracts the embedded candidate table from user-role
//!   payloads
//! - [`accumulator`] folds steps into the per-cycle [`Trace`] and the
//!   display-oriented history log
//!
//! # Quick Start
//!
//! ```rust
//! use tog_trace::{decode_record, Decoded, TraceAccumulator};
//!
//! let mut acc = TraceAccumulator::new();
//! let raw = r#"{"role": "system", "instruction": "reflect", "content": "thinking..."}"#;
//! match decode_record(raw) {
//!     Ok(Decoded::Step(step)) => acc.append(step).unwrap(),
//!     Ok(Decoded::Done) => {}
//!     Err(_) => {} // skip malformed records, keep the stream alive
//! }
//! assert_eq!(acc.trace().len(), 1);
//! ```

pub mod accumulator;
pub mod decoder;
pub mod error;
pub mod step;
pub mod tabular;

pub use accumulator::{HistoryEntry, Trace, TraceAccumulator};
pub use decoder::{decode_record, Decoded, DONE_MARKER, REAL_DATA_MARKER};
pub use error::{DecodeError, TraceError};
pub use step::{
    Answer, Final, Instruction, ModelInput, Payload, PickRelationships, PickSeedEntities,
    PickTriplets, Reflect, RelationshipPick, RetrieveQueries, Role, Step, TripletPick,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
