//! Embedded artist/title tags.
//!
//! Uses the symphonia probe to read both pre-container metadata (ID3v2 in
//! front of an MP3 stream) and container metadata (Vorbis comments, RIFF
//! INFO).  A file may carry any number of artist or title values.

use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported or malformed audio file {path}: {source}")]
    Probe {
        path: String,
        #[source]
        source: symphonia::core::errors::Error,
    },
}

/// Every artist and title value found in a file's tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagValues {
    pub artists: Vec<String>,
    pub titles: Vec<String>,
}

impl TagValues {
    /// Sort tags into artists and titles; everything else is ignored.
    ///
    /// Multi-valued ID3v2.4 text frames separate values with NUL, so those
    /// are split into one value each.  Empty values are dropped; everything
    /// else is kept verbatim.
    pub fn collect<'a, I>(tags: I) -> Self
    where
        I: IntoIterator<Item = &'a Tag>,
    {
        let mut values = TagValues::default();
        for tag in tags {
            let target = match tag.std_key {
                Some(StandardTagKey::Artist) => &mut values.artists,
                Some(StandardTagKey::TrackTitle) => &mut values.titles,
                _ => continue,
            };
            let text = tag.value.to_string();
            target.extend(
                text.split('\0')
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            );
        }
        values
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.titles.is_empty()
    }
}

/// Read the artist and title tags of an audio file.
pub fn read_tags(path: &Path) -> Result<TagValues, TagError> {
    let shown = path.display().to_string();
    let file = File::open(path).map_err(|source| TagError::Io {
        path: shown.clone(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|source| TagError::Probe {
            path: shown.clone(),
            source,
        })?;

    let mut tags: Vec<Tag> = Vec::new();

    if let Some(metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.current() {
            tags.extend(revision.tags().iter().cloned());
        }
    }

    if let Some(revision) = probed.format.metadata().current() {
        tags.extend(revision.tags().iter().cloned());
    }

    let values = TagValues::collect(&tags);
    debug!(
        file = %shown,
        artists = ?values.artists,
        titles = ?values.titles,
        "read embedded tags"
    );
    Ok(values)
}
