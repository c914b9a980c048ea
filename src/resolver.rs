//! Winner selection over weighted candidates.
//!
//! Candidates are grouped by their accumulated weight and the heaviest group
//! wins.  When that group holds more than one candidate, the one most similar
//! to a reference string (normally the original file name) is picked.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;

use crate::candidates::CandidateWeights;
use crate::fuzzy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Nothing survived aggregation, so there is nothing to pick from.
    #[error("no candidate to choose from")]
    EmptyCandidateSet,
}

/// Candidates partitioned by weight, heaviest group first.
///
/// Weights are plain integers, so ordering them numerically gives the same
/// result as a reversed natural sort of their decimal representations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightGroups {
    groups: BTreeMap<Reverse<u32>, BTreeSet<String>>,
}

impl WeightGroups {
    pub fn from_weights(weights: &CandidateWeights) -> Self {
        let mut groups: BTreeMap<Reverse<u32>, BTreeSet<String>> = BTreeMap::new();
        for (candidate, weight) in weights.iter() {
            groups
                .entry(Reverse(weight))
                .or_default()
                .insert(candidate.to_string());
        }
        WeightGroups { groups }
    }

    /// Distinct weights in descending order.
    pub fn weights(&self) -> Vec<u32> {
        self.groups.keys().map(|Reverse(w)| *w).collect()
    }

    /// Candidates sharing exactly `weight`.
    pub fn group(&self, weight: u32) -> Option<&BTreeSet<String>> {
        self.groups.get(&Reverse(weight))
    }

    /// The heaviest group and its weight.
    pub fn top(&self) -> Option<(u32, &BTreeSet<String>)> {
        self.groups.iter().next().map(|(Reverse(w), set)| (*w, set))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Pick the single most likely candidate.
///
/// Ties in the heaviest group are broken by [`fuzzy::token_sort_ratio`]
/// against `reference`.
pub fn resolve(weights: &CandidateWeights, reference: &str) -> Result<String, ResolveError> {
    resolve_with(weights, reference, fuzzy::token_sort_ratio)
}

/// Like [`resolve`], with a caller-supplied similarity scorer.
///
/// `scorer` is only called when the heaviest group has more than one member.
/// Candidates with the same score are separated by their word-order-aware
/// similarity to `reference`, then by lexicographic order.
pub fn resolve_with<F>(
    weights: &CandidateWeights,
    reference: &str,
    mut scorer: F,
) -> Result<String, ResolveError>
where
    F: FnMut(&str, &str) -> u8,
{
    let groups = WeightGroups::from_weights(weights);
    let (weight, winners) = groups.top().ok_or(ResolveError::EmptyCandidateSet)?;

    if winners.len() == 1 {
        let winner = winners.iter().next().cloned().ok_or(ResolveError::EmptyCandidateSet)?;
        debug!(candidate = %winner, weight, "unambiguous winner");
        return Ok(winner);
    }

    debug!(weight, tied = winners.len(), "breaking tie by similarity to {reference:?}");

    let mut best: Option<(&String, (u8, u8))> = None;
    for candidate in winners {
        let score = (
            scorer(candidate, reference),
            fuzzy::processed_ratio(candidate, reference),
        );
        debug!(candidate = %candidate, score = score.0, order_score = score.1, "tie-break score");
        // Iteration is lexicographic, so only a strictly better score replaces the leader
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    best.map(|(winner, _)| winner.clone())
        .ok_or(ResolveError::EmptyCandidateSet)
}
