//! Knowledge-graph projection
//!
//! Derives a deduplicated node/edge view from the trace, distinguishing
//! candidates the agent was offered from elements it confirmed:
//! - every candidate table row contributes nodes (and edges, for
//!   triplet-shaped rows);
//! - rows seen inside a `reflect` step mark their nodes and edges as
//!   highlighted;
//! - an assistant `pick_triplets` selection matching an offered edge
//!   highlights that edge and both endpoints.
//!
//! Projection is a pure function of the trace: re-running it on the same
//! trace yields the same sets, and highlights only ever upgrade as the trace
//! grows.

use indexmap::IndexMap;
use serde::Serialize;
use tog_trace::{Instruction, Payload, Role, Step, Trace};

/// One deduplicated entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Entity identifier (the entity string itself)
    pub id: String,
    /// Display label; first-seen spelling wins
    pub label: String,
    /// Confirmed relevant by reflection or explicit selection
    pub highlighted: bool,
}

/// One deduplicated relationship between two entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    /// Display identifier, derived from the triple
    pub id: String,
    /// Relationship label
    pub label: String,
    /// Head entity id
    pub source: String,
    /// Tail entity id
    pub target: String,
    /// Confirmed relevant by reflection or explicit selection
    pub highlighted: bool,
}

/// Content key of an edge: the exact (head, relationship, tail) triple
type EdgeKey = (String, String, String);

/// Deduplicated graph view derived from a trace
///
/// Serialize the [`nodes`](Self::nodes) and [`edges`](Self::edges) sequences
/// for display; the maps themselves are an internal dedup detail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeGraph {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeKey, Edge>,
}

impl KnowledgeGraph {
    /// Nodes in first-seen order
    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in first-seen order
    #[inline]
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of distinct entities
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct triples
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by entity id
    #[inline]
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up an edge by its exact triple
    #[must_use]
    pub fn edge(&self, head: &str, relationship: &str, tail: &str) -> Option<&Edge> {
        self.edges.get(&(
            head.to_string(),
            relationship.to_string(),
            tail.to_string(),
        ))
    }

    /// Record an entity occurrence; re-encounters may only upgrade highlight
    fn touch_node(&mut self, entity: &str, highlighted: bool) {
        if let Some(node) = self.nodes.get_mut(entity) {
            node.highlighted |= highlighted;
        } else {
            self.nodes.insert(
                entity.to_string(),
                Node {
                    id: entity.to_string(),
                    label: entity.to_string(),
                    highlighted,
                },
            );
        }
    }

    /// Record a triple occurrence; re-encounters may only upgrade highlight
    fn touch_edge(&mut self, head: &str, relationship: &str, tail: &str, highlighted: bool) {
        let key = (
            head.to_string(),
            relationship.to_string(),
            tail.to_string(),
        );
        if let Some(edge) = self.edges.get_mut(&key) {
            edge.highlighted |= highlighted;
        } else {
            self.edges.insert(
                key,
                Edge {
                    id: format!("{head}-{relationship}->{tail}"),
                    label: relationship.to_string(),
                    source: head.to_string(),
                    target: tail.to_string(),
                    highlighted,
                },
            );
        }
    }
}

/// Instructions whose candidate tables contribute nodes
fn contributes_nodes(instruction: Instruction) -> bool {
    matches!(
        instruction,
        Instruction::PickSeedEntities
            | Instruction::PickRelationships
            | Instruction::PickTriplets
            | Instruction::Reflect
    )
}

/// Instructions whose candidate tables contribute edges
fn contributes_edges(instruction: Instruction) -> bool {
    matches!(instruction, Instruction::PickTriplets | Instruction::Reflect)
}

/// Derive the knowledge graph from the full trace
///
/// Deterministic and idempotent: identity is content-derived (entity string
/// for nodes, the exact triple for edges), insertion order is kept for
/// display only.
#[must_use]
pub fn project(trace: &Trace) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::default();

    // Candidate tables offered to the agent
    for step in trace.steps() {
        if step.role != Role::User {
            continue;
        }
        let Some(input) = step.as_model_input() else {
            continue;
        };
        let from_reflect = step.instruction == Instruction::Reflect;

        if contributes_nodes(step.instruction) {
            for row in &input.rows {
                // Entity columns: head always, tail only in triplet-shaped rows
                for index in [0, 2] {
                    match row.get(index) {
                        Some(cell) if !cell.is_empty() => graph.touch_node(cell, from_reflect),
                        _ => {}
                    }
                }
            }
        }
        if contributes_edges(step.instruction) {
            for row in &input.rows {
                if let [head, relationship, tail, ..] = row.as_slice() {
                    graph.touch_edge(head, relationship, tail, from_reflect);
                }
            }
        }
    }

    // Committed selections confirmed by the agent
    for step in trace.steps() {
        if step.role != Role::Assistant {
            continue;
        }
        if let Payload::PickTriplets(picks) = &step.payload {
            for pick in &picks.selection {
                confirm_selection(&mut graph, &pick.head, &pick.relationship, &pick.tail);
            }
        }
    }

    graph
}

/// Highlight an offered edge and its endpoints when the agent selected it
///
/// Selections with no matching offered edge are ignored here; the selection
/// validator surfaces them separately.
fn confirm_selection(graph: &mut KnowledgeGraph, head: &str, relationship: &str, tail: &str) {
    let key = (
        head.to_string(),
        relationship.to_string(),
        tail.to_string(),
    );
    if let Some(edge) = graph.edges.get_mut(&key) {
        edge.highlighted = true;
        if let Some(node) = graph.nodes.get_mut(head) {
            node.highlighted = true;
        }
        if let Some(node) = graph.nodes.get_mut(tail) {
            node.highlighted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tog_trace::{ModelInput, Payload, PickTriplets, Step, TripletPick};

    fn table_step(instruction: Instruction, rows: &[&[&str]]) -> Step {
        Step::new(
            Role::User,
            instruction,
            Payload::ModelInput(ModelInput {
                pretext: String::new(),
                rows: rows
                    .iter()
                    .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                    .collect(),
                posttext: String::new(),
            }),
        )
        .unwrap()
    }

    fn selection_step(triples: &[(&str, &str, &str)]) -> Step {
        Step::new(
            Role::Assistant,
            Instruction::PickTriplets,
            Payload::PickTriplets(PickTriplets {
                selection: triples
                    .iter()
                    .map(|(head, relationship, tail)| TripletPick {
                        head: (*head).to_string(),
                        relationship: (*relationship).to_string(),
                        tail: (*tail).to_string(),
                    })
                    .collect(),
                reason: String::new(),
            }),
        )
        .unwrap()
    }

    fn trace_of(steps: Vec<Step>) -> Trace {
        let mut acc = tog_trace::TraceAccumulator::new();
        for step in steps {
            acc.append(step).unwrap();
        }
        acc.trace().clone()
    }

    #[test]
    fn nodes_from_entity_columns_only() {
        let trace = trace_of(vec![table_step(
            Instruction::PickTriplets,
            &[&["a", "r1", "b"], &["c", "r2", "d"]],
        )]);
        let graph = project(&trace);

        assert_eq!(graph.node_count(), 4);
        assert!(graph.node("a").is_some());
        assert!(graph.node("d").is_some());
        // Relationship column is not an entity
        assert!(graph.node("r1").is_none());
    }

    #[test]
    fn duplicate_rows_are_deduplicated() {
        let trace = trace_of(vec![
            table_step(Instruction::PickSeedEntities, &[&["a"], &["b"]]),
            table_step(Instruction::PickTriplets, &[&["a", "r", "b"], &["a", "r", "b"]]),
        ]);
        let graph = project(&trace);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn reflect_rows_highlight_nodes_and_edges() {
        let trace = trace_of(vec![table_step(
            Instruction::Reflect,
            &[&["a", "r", "b"]],
        )]);
        let graph = project(&trace);

        assert!(graph.node("a").unwrap().highlighted);
        assert!(graph.node("b").unwrap().highlighted);
        assert!(graph.edge("a", "r", "b").unwrap().highlighted);
    }

    #[test]
    fn reflect_upgrades_earlier_candidates() {
        let trace = trace_of(vec![
            table_step(Instruction::PickTriplets, &[&["a", "r", "b"]]),
            table_step(Instruction::Reflect, &[&["a", "r", "b"]]),
        ]);
        let graph = project(&trace);

        assert!(graph.node("a").unwrap().highlighted);
        assert!(graph.edge("a", "r", "b").unwrap().highlighted);
        // First-seen kept: still one node per entity, one edge per triple
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn assistant_confirmation_highlights_edge_and_endpoints() {
        let trace = trace_of(vec![
            table_step(
                Instruction::PickTriplets,
                &[&["a", "r1", "b"], &["c", "r2", "d"]],
            ),
            selection_step(&[("a", "r1", "b")]),
        ]);
        let graph = project(&trace);

        assert!(graph.edge("a", "r1", "b").unwrap().highlighted);
        assert!(graph.node("a").unwrap().highlighted);
        assert!(graph.node("b").unwrap().highlighted);
        assert!(!graph.edge("c", "r2", "d").unwrap().highlighted);
        assert!(!graph.node("c").unwrap().highlighted);
    }

    #[test]
    fn hallucinated_confirmation_is_ignored() {
        let trace = trace_of(vec![
            table_step(Instruction::PickTriplets, &[&["a", "r1", "b"]]),
            selection_step(&[("x", "r9", "y")]),
        ]);
        let graph = project(&trace);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(!graph.edge("a", "r1", "b").unwrap().highlighted);
        assert!(graph.node("x").is_none());
    }

    #[test]
    fn projection_is_deterministic() {
        let trace = trace_of(vec![
            table_step(Instruction::PickSeedEntities, &[&["a"], &["b"]]),
            table_step(Instruction::PickTriplets, &[&["a", "r", "b"]]),
            selection_step(&[("a", "r", "b")]),
            table_step(Instruction::Reflect, &[&["b", "r2", "c"]]),
        ]);

        let first = project(&trace);
        let second = project(&trace);
        assert_eq!(first, second);
        assert_eq!(
            first.nodes().collect::<Vec<_>>(),
            second.nodes().collect::<Vec<_>>()
        );
        assert_eq!(
            first.edges().collect::<Vec<_>>(),
            second.edges().collect::<Vec<_>>()
        );
    }

    #[test]
    fn pair_shaped_rows_contribute_no_edges() {
        let trace = trace_of(vec![table_step(
            Instruction::PickRelationships,
            &[&["a", "r"]],
        )]);
        let graph = project(&trace);

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }
}
