//! Step model for the reasoning trace
//!
//! Defines the fundamental types of the trace stream:
//! - Step roles and instruction phases
//! - Typed payload variants, one per (role, instruction) combination
//! - The parsed user-prompt shape (`ModelInput`)

use serde::{Deserialize, Serialize};

/// Source of a step's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instruction template text injected around the data
    System,
    /// Prompt assembled for the agent (candidate tables)
    User,
    /// Structured agent output
    Assistant,
}

/// Reasoning phase identifier
///
/// Determines the semantic shape of the payload together with [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Derive search queries from the user question
    RetrieveQueries,
    /// Choose starting entities from graph lookup results
    PickSeedEntities,
    /// Choose (entity, relationship) pairs to expand
    PickRelationships,
    /// Choose (head, relationship, tail) triplets to keep
    PickTriplets,
    /// Decide whether collected knowledge answers the question
    Reflect,
    /// Answer from model knowledge alone
    Answer,
    /// Terminal result of the whole cycle
    Final,
}

impl Instruction {
    /// Whether this instruction carries an agent selection list
    /// that can be cross-checked against offered candidates.
    #[inline]
    #[must_use]
    pub fn is_selection(self) -> bool {
        matches!(
            self,
            Self::PickSeedEntities | Self::PickRelationships | Self::PickTriplets
        )
    }
}

/// Parsed user-role payload: free text around an embedded candidate table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInput {
    /// Text before the table (instruction preamble)
    pub pretext: String,
    /// Data rows of the table; the marker/header line is never included
    pub rows: Vec<Vec<String>>,
    /// Text from the response marker onward
    pub posttext: String,
}

impl ModelInput {
    /// Create a table-less input from plain text
    #[inline]
    #[must_use]
    pub fn from_pretext(pretext: impl Into<String>) -> Self {
        Self {
            pretext: pretext.into(),
            rows: Vec::new(),
            posttext: String::new(),
        }
    }
}

/// Assistant payload for `retrieve_queries`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveQueries {
    /// Search queries derived from the question
    pub queries: Vec<String>,
}

/// Assistant payload for `pick_seed_entities`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickSeedEntities {
    /// Selected entity labels
    pub seed_entities: Vec<String>,
    /// Agent's justification
    #[serde(default)]
    pub reason: String,
}

/// One selected (entity, relationship) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPick {
    /// Entity label exactly as offered
    pub entity: String,
    /// Relationship label exactly as offered
    pub relationship: String,
}

/// Assistant payload for `pick_relationships`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRelationships {
    /// Selected pairs, most important first
    pub selection: Vec<RelationshipPick>,
    /// Agent's justification
    #[serde(default)]
    pub reason: String,
}

/// One selected (head, relationship, tail) triplet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripletPick {
    /// Head entity label
    pub head: String,
    /// Relationship label
    pub relationship: String,
    /// Tail entity label
    pub tail: String,
}

/// Assistant payload for `pick_triplets`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickTriplets {
    /// Selected triplets, most important first
    pub selection: Vec<TripletPick>,
    /// Agent's justification
    #[serde(default)]
    pub reason: String,
}

/// Assistant payload for `reflect`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflect {
    /// Whether the collected triplets suffice to answer
    #[serde(default)]
    pub found_knowledge: bool,
    /// Machine-comparable answer (empty if none yet)
    #[serde(default)]
    pub machine_answer: String,
    /// Human-readable answer (empty if none yet)
    #[serde(default)]
    pub user_answer: String,
    /// Agent's justification
    #[serde(default)]
    pub reason: String,
}

/// Assistant payload for `answer` (model-knowledge fallback)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Machine-comparable answer
    #[serde(default)]
    pub machine_answer: String,
    /// Human-readable answer
    #[serde(default)]
    pub user_answer: String,
}

/// Assistant payload for `final` - the terminal cycle result
///
/// Carries the answer plus diagnostic counters from the backend run.
/// Unknown extra fields are tolerated; missing fields default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Final {
    /// Machine-comparable answer
    #[serde(default)]
    pub machine_answer: String,
    /// Human-readable answer shown to the user
    #[serde(default)]
    pub user_answer: String,
    /// Whether the answer came from graph exploration
    #[serde(default)]
    pub is_kg_based_answer: bool,
    /// Knowledge-graph queries issued
    #[serde(default)]
    pub kg_calls: u32,
    /// Agent invocations issued
    #[serde(default)]
    pub agent_calls: u32,
    /// Exploration depth reached
    #[serde(default)]
    pub depth: u32,
    /// Agent ignored its instruction constraints
    #[serde(default)]
    pub has_err_instruction: bool,
    /// Agent output was not decodable
    #[serde(default)]
    pub has_err_format: bool,
    /// Graph backend failed
    #[serde(default)]
    pub has_err_graph: bool,
    /// Agent backend failed
    #[serde(default)]
    pub has_err_agent: bool,
    /// Any other failure
    #[serde(default)]
    pub has_err_other: bool,
}

/// Payload of a step; the active variant is fixed by (role, instruction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// System-role free text
    SystemText(String),
    /// User-role parsed prompt
    ModelInput(ModelInput),
    /// Assistant `retrieve_queries` output
    RetrieveQueries(RetrieveQueries),
    /// Assistant `pick_seed_entities` output
    PickSeedEntities(PickSeedEntities),
    /// Assistant `pick_relationships` output
    PickRelationships(PickRelationships),
    /// Assistant `pick_triplets` output
    PickTriplets(PickTriplets),
    /// Assistant `reflect` output
    Reflect(Reflect),
    /// Assistant `answer` output
    Answer(Answer),
    /// Assistant `final` output
    Final(Final),
}

impl Payload {
    /// Check that this variant is legal for the given (role, instruction)
    #[must_use]
    pub fn matches(&self, role: Role, instruction: Instruction) -> bool {
        match role {
            Role::System => matches!(self, Self::SystemText(_)),
            Role::User => matches!(self, Self::ModelInput(_)),
            Role::Assistant => matches!(
                (self, instruction),
                (Self::RetrieveQueries(_), Instruction::RetrieveQueries)
                    | (Self::PickSeedEntities(_), Instruction::PickSeedEntities)
                    | (Self::PickRelationships(_), Instruction::PickRelationships)
                    | (Self::PickTriplets(_), Instruction::PickTriplets)
                    | (Self::Reflect(_), Instruction::Reflect)
                    | (Self::Answer(_), Instruction::Answer)
                    | (Self::Final(_), Instruction::Final)
            ),
        }
    }
}

/// One decoded unit of the reasoning trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Content source
    pub role: Role,
    /// Reasoning phase
    pub instruction: Instruction,
    /// Typed payload, legal for (role, instruction) by construction
    pub payload: Payload,
}

impl Step {
    /// Create a step, enforcing the payload legality invariant
    ///
    /// # Errors
    /// [`DecodeError::PayloadMismatch`](crate::error::DecodeError::PayloadMismatch)
    /// when the payload variant is illegal for the (role, instruction) pair.
    pub fn new(
        role: Role,
        instruction: Instruction,
        payload: Payload,
    ) -> Result<Self, crate::error::DecodeError> {
        if !payload.matches(role, instruction) {
            return Err(crate::error::DecodeError::PayloadMismatch { role, instruction });
        }
        Ok(Self {
            role,
            instruction,
            payload,
        })
    }

    /// Parsed prompt, if this is a user-role step
    #[inline]
    #[must_use]
    pub fn as_model_input(&self) -> Option<&ModelInput> {
        match &self.payload {
            Payload::ModelInput(input) => Some(input),
            _ => None,
        }
    }

    /// Selected triplets, if this is an assistant `pick_triplets` step
    #[inline]
    #[must_use]
    pub fn as_triplet_selection(&self) -> Option<&[TripletPick]> {
        match &self.payload {
            Payload::PickTriplets(picks) => Some(&picks.selection),
            _ => None,
        }
    }

    /// Terminal result, if this is the `final` step
    #[inline]
    #[must_use]
    pub fn as_final(&self) -> Option<&Final> {
        match &self.payload {
            Payload::Final(result) => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_instruction_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(
            serde_json::to_string(&Instruction::PickSeedEntities).unwrap(),
            "\"pick_seed_entities\""
        );
        let parsed: Instruction = serde_json::from_str("\"retrieve_queries\"").unwrap();
        assert_eq!(parsed, Instruction::RetrieveQueries);
    }

    #[test]
    fn payload_matches_role_and_instruction() {
        let payload = Payload::Reflect(Reflect::default());
        assert!(payload.matches(Role::Assistant, Instruction::Reflect));
        assert!(!payload.matches(Role::Assistant, Instruction::Answer));
        assert!(!payload.matches(Role::User, Instruction::Reflect));

        let input = Payload::ModelInput(ModelInput::default());
        assert!(input.matches(Role::User, Instruction::Reflect));
        assert!(input.matches(Role::User, Instruction::PickTriplets));
        assert!(!input.matches(Role::System, Instruction::Reflect));
    }

    #[test]
    fn step_new_rejects_mismatch() {
        let err = Step::new(
            Role::Assistant,
            Instruction::Final,
            Payload::SystemText("nope".to_string()),
        );
        assert!(err.is_err());

        let ok = Step::new(
            Role::Assistant,
            Instruction::Final,
            Payload::Final(Final::default()),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn final_payload_tolerates_missing_and_unknown_fields() {
        let result: Final =
            serde_json::from_str(r#"{"user_answer": "42", "unexpected": true}"#).unwrap();
        assert_eq!(result.user_answer, "42");
        assert_eq!(result.machine_answer, "");
        assert!(!result.is_kg_based_answer);
        assert_eq!(result.kg_calls, 0);
    }

    #[test]
    fn selection_instructions() {
        assert!(Instruction::PickSeedEntities.is_selection());
        assert!(Instruction::PickTriplets.is_selection());
        assert!(!Instruction::Reflect.is_selection());
        assert!(!Instruction::Final.is_selection());
    }
}
