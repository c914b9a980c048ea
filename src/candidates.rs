//! Weighted candidate aggregation.
//!
//! Fingerprint matches and embedded tags both propose values for the artist
//! and title of a file.  Each proposal adds weight to its candidate string;
//! tags count more than a single fingerprint match because they were written
//! for this exact file rather than inferred from its audio.

use std::collections::HashMap;

/// Matches must score strictly above this confidence to be counted.
pub const DEFAULT_THRESHOLD: f64 = 0.90;

/// Weight added for every embedded tag value.
pub const DEFAULT_TAG_WEIGHT: u32 = 2;

/// One result from the fingerprint lookup service.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    /// Match confidence in `[0, 1]`
    pub confidence: f64,
    /// MusicBrainz recording ID
    pub recording_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl ScoredMatch {
    /// The value of `field`, but only when the match is complete.
    ///
    /// A match missing either its artist or its title is useless for both
    /// fields, so this returns `None` for both in that case.
    pub fn field(&self, field: Field) -> Option<&str> {
        match (self.artist.as_deref(), self.title.as_deref()) {
            (Some(artist), Some(title)) => Some(match field {
                Field::Artist => artist,
                Field::Title => title,
            }),
            _ => None,
        }
    }
}

/// Which label a candidate set is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Artist,
    Title,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Artist => "artist",
            Field::Title => "title",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Accumulated weight per candidate string.
///
/// Keys are compared exactly (case-sensitive, no normalization).  Every
/// stored weight is at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateWeights {
    weights: HashMap<String, u32>,
}

impl CandidateWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to `candidate`, saturating at `u32::MAX`.  Adding zero
    /// is a no-op so the "every key has weight >= 1" invariant holds.
    pub fn add(&mut self, candidate: &str, weight: u32) {
        if weight == 0 {
            return;
        }
        let total = self.weights.entry(candidate.to_string()).or_insert(0);
        *total = total.saturating_add(weight);
    }

    /// Fold another set of weights into this one.
    pub fn merge(&mut self, other: &CandidateWeights) {
        for (candidate, &weight) in &other.weights {
            self.add(candidate, weight);
        }
    }

    pub fn get(&self, candidate: &str) -> Option<u32> {
        self.weights.get(candidate).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.weights.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for CandidateWeights {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut weights = CandidateWeights::new();
        for (candidate, weight) in iter {
            let candidate: String = candidate.into();
            weights.add(&candidate, weight);
        }
        weights
    }
}

/// Build the candidate weights for one field.
///
/// Every complete match scoring above `threshold` adds 1 to its value for
/// `field`; every tag value adds `tag_weight`.
pub fn aggregate<S: AsRef<str>>(
    matches: &[ScoredMatch],
    tag_values: &[S],
    threshold: f64,
    tag_weight: u32,
    field: Field,
) -> CandidateWeights {
    let mut weights = CandidateWeights::new();

    for m in matches {
        if m.confidence <= threshold {
            continue;
        }
        if let Some(value) = m.field(field) {
            weights.add(value, 1);
        }
    }

    for tag in tag_values {
        weights.add(tag.as_ref(), tag_weight);
    }

    weights
}
