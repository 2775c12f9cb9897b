//! Error types for trace decoding and accumulation
//!
//! Decode errors are local and recoverable: the consuming layer skips the
//! offending record and keeps the stream alive. Trace errors indicate a
//! caller ordering bug (append after the cycle completed).

use crate::step::{Instruction, Role};

/// Errors while decoding one raw stream record
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Outer record is not a JSON object with the expected fields
    #[error("malformed record: {0}")]
    MalformedRecord(#[from] serde_json::Error),

    /// Assistant content string is not decodable as the instruction's shape
    #[error("assistant content not decodable as {instruction:?}: {message}")]
    AssistantContent {
        /// Instruction selecting the expected shape
        instruction: Instruction,
        /// Underlying decode failure
        message: String,
    },

    /// Payload variant is illegal for the (role, instruction) pair
    #[error("payload does not match ({role:?}, {instruction:?})")]
    PayloadMismatch {
        /// Record's role
        role: Role,
        /// Record's instruction
        instruction: Instruction,
    },

    /// Content field is missing or has an unusable type
    #[error("unusable content for ({role:?}, {instruction:?})")]
    UnusableContent {
        /// Record's role
        role: Role,
        /// Record's instruction
        instruction: Instruction,
    },
}

/// Errors from the trace accumulator
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The cycle already ended (`final` step or transport error);
    /// `reset()` must happen before the next append
    #[error("cycle already complete; reset before appending")]
    CycleComplete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display() {
        let err = DecodeError::PayloadMismatch {
            role: Role::User,
            instruction: Instruction::Reflect,
        };
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn trace_error_display() {
        assert!(TraceError::CycleComplete.to_string().contains("reset"));
    }
}
