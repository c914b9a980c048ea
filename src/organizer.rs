//! Per-file pipeline: fingerprint, read tags, resolve, move.
//!
//! The two evidence sources sit behind the [`MatchSource`] and [`TagSource`]
//! traits.  [`AcoustIdClient`] and [`EmbeddedTags`] are the real
//! implementations.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::acoustid::{AcoustIdClient, AcoustIdError};
use crate::candidates::ScoredMatch;
use crate::error::{Error, Result};
use crate::identify::{self, Identification, Settings};
use crate::relocate;
use crate::tags::{self, TagError, TagValues};

// ── Sources ──────────────────────────────────────────────────────────────────

/// Something that can turn an audio file into scored recording matches.
pub trait MatchSource {
    fn match_file(&mut self, path: &Path) -> std::result::Result<Vec<ScoredMatch>, AcoustIdError>;
}

impl MatchSource for AcoustIdClient {
    fn match_file(&mut self, path: &Path) -> std::result::Result<Vec<ScoredMatch>, AcoustIdError> {
        AcoustIdClient::match_file(self, path)
    }
}

/// Something that can read a file's artist and title tags.
pub trait TagSource {
    fn read_tags(&self, path: &Path) -> std::result::Result<TagValues, TagError>;
}

/// Tags embedded in the audio file itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTags;

impl TagSource for EmbeddedTags {
    fn read_tags(&self, path: &Path) -> std::result::Result<TagValues, TagError> {
        tags::read_tags(path)
    }
}

// ── Organizer ────────────────────────────────────────────────────────────────

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub source: PathBuf,
    pub identification: Identification,
    pub target: PathBuf,
    /// `false` in dry-run mode
    pub moved: bool,
}

pub struct Organizer<M, T> {
    matches: M,
    tags: T,
    settings: Settings,
    dest_root: PathBuf,
    dry_run: bool,
}

impl<M: MatchSource, T: TagSource> Organizer<M, T> {
    pub fn new(matches: M, tags: T, settings: Settings, dest_root: &Path) -> Self {
        Organizer {
            matches,
            tags,
            settings,
            dest_root: dest_root.to_path_buf(),
            dry_run: false,
        }
    }

    /// Resolve files but leave them where they are.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Work out the artist and title of `path`.
    ///
    /// The path as given is the reference for tie-breaking.
    pub fn identify(&mut self, path: &Path) -> Result<Identification> {
        let matches = self.matches.match_file(path)?;
        let tag_values = self.tags.read_tags(path)?;
        if matches.is_empty() && tag_values.is_empty() {
            warn!(file = %path.display(), "neither fingerprint matches nor tags available");
        }

        let reference = path.to_string_lossy();
        identify::identify(&matches, &tag_values, &reference, &self.settings).map_err(|reason| {
            Error::Unresolved {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    /// Identify `path` and move it to `<dest>/<artist>/<title>.<ext>`.
    pub fn process(&mut self, path: &Path) -> Result<Outcome> {
        let identification = self.identify(path)?;
        let target = relocate::target_path(&self.dest_root, &identification, path);

        if self.dry_run {
            info!(file = %path.display(), target = %target.display(), "dry run, not moving");
        } else {
            relocate::relocate(path, &target)?;
        }

        Ok(Outcome {
            source: path.to_path_buf(),
            identification,
            target,
            moved: !self.dry_run,
        })
    }
}
