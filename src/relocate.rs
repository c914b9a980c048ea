//! Moving identified files into `<artist>/<title>.<ext>`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::identify::Identification;

/// Used when the source file has no extension.
const FALLBACK_EXTENSION: &str = "mp3";

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("{} already exists, refusing to overwrite", .0.display())]
    TargetExists(PathBuf),

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Make a label safe to use as a single path component.
fn path_component(label: &str) -> String {
    let cleaned = label.replace(['/', '\\'], "-");
    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        s => s.to_string(),
    }
}

/// Where `source` ends up for the given identification.
pub fn target_path(dest_root: &Path, id: &Identification, source: &Path) -> PathBuf {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(FALLBACK_EXTENSION);
    dest_root
        .join(path_component(&id.artist))
        .join(format!("{}.{}", path_component(&id.title), ext))
}

/// Copy `source` to a freshly created `target`; an existing target is an error.
fn copy_new(source: &Path, target: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(target)?;
    if let Err(e) = io::copy(&mut reader, &mut writer) {
        let _ = fs::remove_file(target);
        return Err(e);
    }
    Ok(())
}

/// Move `source` to `target`, creating the parent directory if needed.
///
/// The file is hard-linked into place and then unlinked from `source`, so an
/// existing target is never replaced.  Falls back to copy-and-delete when
/// linking is impossible, e.g. across filesystems.
pub fn relocate(source: &Path, target: &Path) -> Result<(), RelocateError> {
    if target.exists() {
        return Err(RelocateError::TargetExists(target.to_path_buf()));
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| RelocateError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let move_error = |e: io::Error| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            RelocateError::TargetExists(target.to_path_buf())
        } else {
            RelocateError::Move {
                from: source.to_path_buf(),
                to: target.to_path_buf(),
                source: e,
            }
        }
    };

    match fs::hard_link(source, target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(move_error(e)),
        Err(e) => {
            debug!(error = %e, "hard link failed, copying instead");
            copy_new(source, target).map_err(move_error)?;
        }
    }
    fs::remove_file(source).map_err(move_error)?;

    debug!(from = %source.display(), to = %target.display(), "moved file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(artist: &str, title: &str) -> Identification {
        Identification {
            artist: artist.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_target_path_keeps_extension() {
        let target = target_path(Path::new("/music"), &id("The Beatles", "Yesterday"), Path::new("/tmp/track01.flac"));
        assert_eq!(target, PathBuf::from("/music/The Beatles/Yesterday.flac"));

        let target = target_path(Path::new("."), &id("Queen", "Under Pressure"), Path::new("noext"));
        assert_eq!(target, PathBuf::from("./Queen/Under Pressure.mp3"));
    }

    #[test]
    fn test_target_path_sanitizes_separators() {
        let target = target_path(Path::new("/music"), &id("AC/DC", "Back\\In Black"), Path::new("a.mp3"));
        assert_eq!(target, PathBuf::from("/music/AC-DC/Back-In Black.mp3"));

        let target = target_path(Path::new("/music"), &id("..", " "), Path::new("a.mp3"));
        assert_eq!(target, PathBuf::from("/music/_/_.mp3"));
    }

    #[test]
    fn test_relocate_creates_artist_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("unknown.mp3");
        fs::write(&source, b"audio").unwrap();

        let target = target_path(dir.path(), &id("Queen", "Under Pressure"), &source);
        relocate(&source, &target).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"audio");
    }

    #[test]
    fn test_relocate_into_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Queen")).unwrap();
        let source = dir.path().join("b.mp3");
        fs::write(&source, b"b").unwrap();

        let target = dir.path().join("Queen").join("Bicycle Race.mp3");
        relocate(&source, &target).unwrap();
        assert!(target.exists());
    }

    #[test]
    fn test_relocate_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("new.mp3");
        let target = dir.path().join("Queen").join("Song.mp3");
        fs::write(&source, b"new").unwrap();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"old").unwrap();

        let err = relocate(&source, &target).unwrap_err();
        assert!(matches!(err, RelocateError::TargetExists(_)));
        assert!(source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_relocate_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = relocate(&dir.path().join("gone.mp3"), &dir.path().join("A").join("B.mp3")).unwrap_err();
        assert!(matches!(err, RelocateError::Move { .. }));
    }

    #[test]
    fn test_copy_never_replaces_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("new.mp3");
        let target = dir.path().join("taken.mp3");
        fs::write(&source, b"new").unwrap();
        fs::write(&target, b"old").unwrap();

        let err = copy_new(&source, &target).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&target).unwrap(), b"old");
        assert!(source.exists());
    }

    #[test]
    fn test_copy_to_fresh_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("new.mp3");
        let target = dir.path().join("fresh.mp3");
        fs::write(&source, b"audio").unwrap();

        copy_new(&source, &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"audio");
    }
}
