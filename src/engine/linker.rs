//! Cycle-by-cycle reconciliation of two match lists.
//!
//! The algorithm:
//! 1. Index B by identity key, one FIFO queue of indices per key
//! 2. Walk normalized A in order; a hit pops the front of its queue
//! 3. Whatever B indices were never popped become pending B
//!
//! Nothing is carried across cycles. Duplicate keys (two concurrent fixtures
//! with identical names) are resolved by arrival order only.

use std::collections::{HashMap, VecDeque};

use crate::data::models::{LinkedPair, MatchEntity, MatchKey};

/// Result of one linking pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    pub linked: Vec<LinkedPair>,
    /// Pending A entities with their source-native spelling.
    pub pending_a_raw: Vec<MatchEntity>,
    /// Same entities after normalization, index-aligned with `pending_a_raw`.
    pub pending_a: Vec<MatchEntity>,
    pub pending_b: Vec<MatchEntity>,
}

impl LinkOutcome {
    pub fn linked_total(&self) -> usize {
        self.linked.len()
    }

    /// Rows needed to show both pending columns side by side.
    pub fn pending_total(&self) -> usize {
        self.pending_a.len().max(self.pending_b.len())
    }
}

/// Split A (raw + normalized, index-aligned) and B into linked and pending.
///
/// O(n + m).
pub fn link(a_raw: &[MatchEntity], a_normalized: &[MatchEntity], b: &[MatchEntity]) -> LinkOutcome {
    let mut b_by_key: HashMap<MatchKey, VecDeque<usize>> = HashMap::with_capacity(b.len());
    for (index, entity) in b.iter().enumerate() {
        b_by_key.entry(entity.key()).or_default().push_back(index);
    }

    let mut used = vec![false; b.len()];
    let mut outcome = LinkOutcome::default();

    for (index, normalized) in a_normalized.iter().enumerate() {
        let hit = b_by_key
            .get_mut(&normalized.key())
            .and_then(VecDeque::pop_front);

        match hit {
            Some(b_index) => {
                used[b_index] = true;
                outcome.linked.push(LinkedPair {
                    a: normalized.clone(),
                    b: b[b_index].clone(),
                });
            }
            None => {
                let raw = a_raw.get(index).unwrap_or(normalized);
                outcome.pending_a_raw.push(raw.clone());
                outcome.pending_a.push(normalized.clone());
            }
        }
    }

    outcome.pending_b = b
        .iter()
        .zip(used)
        .filter(|(_, used)| !used)
        .map(|(entity, _)| entity.clone())
        .collect();

    outcome
}
