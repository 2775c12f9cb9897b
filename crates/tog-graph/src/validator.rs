//! Selection validator
//!
//! Cross-checks an agent's selection against the candidate table it was
//! offered in the immediately preceding user step. A selection whose tuple
//! does not appear verbatim among the candidate rows is a hallucinated
//! selection - an annotation for display, not an error.

use tog_trace::{Payload, Step};

/// Indices of hallucinated entries within an assistant selection list
///
/// Comparison is exact: length and element-wise equality, order- and
/// case-sensitive. Shapes per instruction: 1-tuple entity for
/// `pick_seed_entities`, (entity, relationship) for `pick_relationships`,
/// (head, relationship, tail) for `pick_triplets`.
///
/// Fails open: a non-selection assistant step, or an `offer` that is not a
/// parsed user prompt, yields no flags.
#[must_use]
pub fn hallucinated_selections(offer: &Step, selection: &Step) -> Vec<usize> {
    let Some(input) = offer.as_model_input() else {
        return Vec::new();
    };

    let tuples: Vec<Vec<String>> = match &selection.payload {
        Payload::PickSeedEntities(picks) => picks
            .seed_entities
            .iter()
            .map(|entity| vec![entity.clone()])
            .collect(),
        Payload::PickRelationships(picks) => picks
            .selection
            .iter()
            .map(|pick| vec![pick.entity.clone(), pick.relationship.clone()])
            .collect(),
        Payload::PickTriplets(picks) => picks
            .selection
            .iter()
            .map(|pick| {
                vec![
                    pick.head.clone(),
                    pick.relationship.clone(),
                    pick.tail.clone(),
                ]
            })
            .collect(),
        _ => return Vec::new(),
    };

    tuples
        .into_iter()
        .enumerate()
        .filter(|(_, tuple)| !input.rows.contains(tuple))
        .map(|(index, _)| index)
        .collect()
}
