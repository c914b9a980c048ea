//! Artist and title resolution for a single file.
//!
//! Combines fingerprint matches and embedded tags into one candidate set per
//! field and resolves each with the same reference string.

use thiserror::Error;
use tracing::{debug, info};

use crate::candidates::{self, Field, ScoredMatch, DEFAULT_TAG_WEIGHT, DEFAULT_THRESHOLD};
use crate::resolver::{self, ResolveError};
use crate::tags::TagValues;

/// Tuning knobs for candidate aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Fingerprint matches at or below this confidence are ignored
    pub threshold: f64,
    /// Weight of each embedded tag value
    pub tag_weight: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            threshold: DEFAULT_THRESHOLD,
            tag_weight: DEFAULT_TAG_WEIGHT,
        }
    }
}

/// The resolved labels for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub artist: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve {field}")]
pub struct IdentifyError {
    pub field: Field,
    #[source]
    pub source: ResolveError,
}

/// Rewrite the multi-artist separator used by AcoustID as a "feat." credit.
pub fn normalize_artist(artist: &str) -> String {
    artist.replace("; ", " feat. ")
}

/// Resolve a single field.
pub fn resolve_field(
    field: Field,
    matches: &[ScoredMatch],
    tag_values: &[String],
    reference: &str,
    settings: &Settings,
) -> Result<String, IdentifyError> {
    let weights = candidates::aggregate(
        matches,
        tag_values,
        settings.threshold,
        settings.tag_weight,
        field,
    );
    debug!(%field, candidates = weights.len(), "aggregated candidates");

    resolver::resolve(&weights, reference).map_err(|source| IdentifyError { field, source })
}

/// Resolve artist and title for the file described by `reference`.
pub fn identify(
    matches: &[ScoredMatch],
    tags: &TagValues,
    reference: &str,
    settings: &Settings,
) -> Result<Identification, IdentifyError> {
    let artist = resolve_field(Field::Artist, matches, &tags.artists, reference, settings)?;
    let title = resolve_field(Field::Title, matches, &tags.titles, reference, settings)?;

    let identification = Identification {
        artist: normalize_artist(&artist),
        title,
    };
    info!(
        artist = %identification.artist,
        title = %identification.title,
        "identified {reference}"
    );
    Ok(identification)
}
