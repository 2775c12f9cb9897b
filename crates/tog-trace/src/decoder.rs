//! Event decoder
//!
//! Validates and normalizes one raw streamed record into a typed [`Step`].
//! The stream delivers JSON objects with `role`, `instruction` and `content`
//! fields, where `content` is usually a string needing secondary decoding,
//! plus a literal end-of-stream sentinel. Decode failures are recoverable:
//! callers skip the record and keep consuming.

use crate::error::DecodeError;
use crate::step::{Instruction, ModelInput, Payload, Role, Step};
use crate::tabular;
use serde::Deserialize;
use serde_json::Value;

/// End-of-stream sentinel; matched as a substring of the raw record
pub const DONE_MARKER: &str = "[DONE]";

/// Marker substring stripped from system-role content
pub const REAL_DATA_MARKER: &str = "### Real Data ###";

/// Outcome of decoding one raw record
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A well-formed trace step
    Step(Step),
    /// The stream finished successfully; no step is produced
    Done,
}

/// Raw wire shape of one record
#[derive(Debug, Deserialize)]
struct RawRecord {
    role: Role,
    instruction: Instruction,
    #[serde(default)]
    content: Value,
}

/// Decode one raw stream record
///
/// # Errors
/// Returns a [`DecodeError`] when the record is malformed; callers are
/// expected to skip the record rather than abort the stream.
pub fn decode_record(raw: &str) -> Result<Decoded, DecodeError> {
    if raw.contains(DONE_MARKER) {
        return Ok(Decoded::Done);
    }

    let record: RawRecord = serde_json::from_str(raw)?;
    let payload = match record.role {
        Role::System => decode_system(&record)?,
        Role::User => decode_user(&record),
        Role::Assistant => decode_assistant(&record)?,
    };

    Step::new(record.role, record.instruction, payload).map(Decoded::Step)
}

/// System content passes through with the data marker stripped
fn decode_system(record: &RawRecord) -> Result<Payload, DecodeError> {
    match &record.content {
        Value::String(text) => Ok(Payload::SystemText(text.replacen(REAL_DATA_MARKER, "", 1))),
        _ => Err(DecodeError::UnusableContent {
            role: record.role,
            instruction: record.instruction,
        }),
    }
}

/// User content runs through the tabular payload parser
fn decode_user(record: &RawRecord) -> Payload {
    let input = match &record.content {
        Value::String(text) => tabular::parse_model_input(text, record.instruction),
        other => ModelInput::from_pretext(other.to_string()),
    };
    Payload::ModelInput(input)
}

/// Assistant content decodes into the variant selected by the instruction
///
/// A string content is itself JSON and is parsed first; an object content is
/// used as-is.
fn decode_assistant(record: &RawRecord) -> Result<Payload, DecodeError> {
    let value = match &record.content {
        Value::String(text) => {
            serde_json::from_str(text).map_err(|err| DecodeError::AssistantContent {
                instruction: record.instruction,
                message: err.to_string(),
            })?
        }
        Value::Object(_) => record.content.clone(),
        _ => {
            return Err(DecodeError::UnusableContent {
                role: record.role,
                instruction: record.instruction,
            })
        }
    };

    let coerce = |err: serde_json::Error| DecodeError::AssistantContent {
        instruction: record.instruction,
        message: err.to_string(),
    };

    Ok(match record.instruction {
        Instruction::RetrieveQueries => {
            Payload::RetrieveQueries(serde_json::from_value(value).map_err(coerce)?)
        }
        Instruction::PickSeedEntities => {
            Payload::PickSeedEntities(serde_json::from_value(value).map_err(coerce)?)
        }
        Instruction::PickRelationships => {
            Payload::PickRelationships(serde_json::from_value(value).map_err(coerce)?)
        }
        Instruction::PickTriplets => {
            Payload::PickTriplets(serde_json::from_value(value).map_err(coerce)?)
        }
        Instruction::Reflect => Payload::Reflect(serde_json::from_value(value).map_err(coerce)?),
        Instruction::Answer => Payload::Answer(serde_json::from_value(value).map_err(coerce)?),
        Instruction::Final => Payload::Final(serde_json::from_value(value).map_err(coerce)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn done_sentinel_terminates() {
        assert_eq!(decode_record("[DONE]").unwrap(), Decoded::Done);
        assert_eq!(decode_record("data: [DONE]").unwrap(), Decoded::Done);
    }

    #[test]
    fn assistant_string_content_is_decoded_twice() {
        let raw = r#"{
            "role": "assistant",
            "instruction": "pick_triplets",
            "content": "{\"selection\": [{\"head\": \"a\", \"relationship\": \"r\", \"tail\": \"b\"}], \"reason\": \"why\"}"
        }"#;

        let Decoded::Step(step) = decode_record(raw).unwrap() else {
            panic!("expected step");
        };
        assert_eq!(step.role, Role::Assistant);
        assert_eq!(step.instruction, Instruction::PickTriplets);
        let selection = step.as_triplet_selection().unwrap();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].head, "a");
        assert_eq!(selection[0].tail, "b");
    }

    #[test]
    fn assistant_object_content_is_used_directly() {
        let raw = r#"{
            "role": "assistant",
            "instruction": "retrieve_queries",
            "content": {"queries": ["q1", "q2"]}
        }"#;

        let Decoded::Step(step) = decode_record(raw).unwrap() else {
            panic!("expected step");
        };
        assert_eq!(
            step.payload,
            Payload::RetrieveQueries(crate::step::RetrieveQueries {
                queries: vec!["q1".to_string(), "q2".to_string()],
            })
        );
    }

    #[test]
    fn assistant_garbage_content_is_an_error() {
        let raw = r#"{
            "role": "assistant",
            "instruction": "reflect",
            "content": "this is not json"
        }"#;
        assert!(matches!(
            decode_record(raw),
            Err(DecodeError::AssistantContent { .. })
        ));
    }

    #[test]
    fn assistant_wrong_shape_is_an_error() {
        // Valid JSON, wrong variant shape for the instruction
        let raw = r#"{
            "role": "assistant",
            "instruction": "retrieve_queries",
            "content": "{\"queries\": \"not-a-list\"}"
        }"#;
        assert!(decode_record(raw).is_err());
    }

    #[test]
    fn system_marker_is_stripped() {
        let raw = r#"{
            "role": "system",
            "instruction": "pick_seed_entities",
            "content": "instructions here\n### Real Data ###"
        }"#;

        let Decoded::Step(step) = decode_record(raw).unwrap() else {
            panic!("expected step");
        };
        assert_eq!(
            step.payload,
            Payload::SystemText("instructions here\n".to_string())
        );
    }

    #[test]
    fn user_content_runs_tabular_parser() {
        let raw = r#"{
            "role": "user",
            "instruction": "pick_seed_entities",
            "content": "intro\nENTITIES:\nfoo\nbar\nAGENT RESPONSE:"
        }"#;

        let Decoded::Step(step) = decode_record(raw).unwrap() else {
            panic!("expected step");
        };
        let input = step.as_model_input().unwrap();
        assert_eq!(input.pretext, "intro");
        assert_eq!(
            input.rows,
            vec![vec!["foo".to_string()], vec!["bar".to_string()]]
        );
    }

    #[test]
    fn unknown_role_or_instruction_is_rejected() {
        let raw = r#"{"role": "narrator", "instruction": "final", "content": "x"}"#;
        assert!(matches!(
            decode_record(raw),
            Err(DecodeError::MalformedRecord(_))
        ));

        let raw = r#"{"role": "user", "instruction": "improvise", "content": "x"}"#;
        assert!(decode_record(raw).is_err());
    }

    #[test]
    fn missing_content_for_system_is_rejected() {
        let raw = r#"{"role": "system", "instruction": "final"}"#;
        assert!(matches!(
            decode_record(raw),
            Err(DecodeError::UnusableContent { .. })
        ));
    }
}
