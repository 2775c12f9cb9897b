//! Tabular payload parser
//!
//! User-role payloads embed a delimited candidate table between an
//! instruction-specific start marker and a fixed response marker. This module
//! splits such a payload into pretext / data rows / posttext. Parsing never
//! fails: missing or unknown markers degrade to an unparsed pretext.

use crate::step::{Instruction, ModelInput};

/// Fixed marker separating the candidate table from the response stub
pub const DATA_END_MARKER: &str = "AGENT RESPONSE:";

/// Start marker of the candidate table for a given instruction
///
/// `None` means the instruction's payload carries no table.
#[must_use]
pub fn data_start_marker(instruction: Instruction) -> Option<&'static str> {
    match instruction {
        Instruction::PickSeedEntities => Some("ENTITIES:"),
        Instruction::PickRelationships => Some("ENTITY,RELATIONSHIP"),
        Instruction::PickTriplets | Instruction::Reflect => {
            Some("HEAD_ENTITY,RELATIONSHIP,TAIL_ENTITY")
        }
        _ => None,
    }
}

/// Parse a raw user-role payload into a [`ModelInput`]
///
/// The marker line itself (bare label or CSV column header) is excluded from
/// `rows`, so every returned row is a data row and consumers iterate all of
/// them. Rows are parsed with standard CSV quoting rules: commas inside
/// quoted fields are literal.
#[must_use]
pub fn parse_model_input(content: &str, instruction: Instruction) -> ModelInput {
    let Some(marker) = data_start_marker(instruction) else {
        // No table expected: strip the response marker and keep the text
        return ModelInput::from_pretext(content.replace(DATA_END_MARKER, "").trim());
    };

    let Some(start) = content.find(marker) else {
        return ModelInput::from_pretext(content.trim());
    };
    let end = content[start..]
        .find(DATA_END_MARKER)
        .map_or(content.len(), |offset| start + offset);

    // The table section starts at the marker; drop the marker line itself
    let section = &content[start..end];
    let data = section.split_once('\n').map_or("", |(_, rest)| rest);

    ModelInput {
        pretext: content[..start].trim().to_string(),
        rows: parse_rows(data.trim()),
        posttext: content[end..].trim().to_string(),
    }
}

/// Parse the delimited table section into rows
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
            Err(err) => tracing::debug!("skipping unparseable table row: {err}"),
        }
    }
    rows
}
