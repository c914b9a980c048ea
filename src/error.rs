use std::path::PathBuf;

use thiserror::Error;

use crate::acoustid::AcoustIdError;
use crate::config::ConfigError;
use crate::identify::IdentifyError;
use crate::relocate::RelocateError;
use crate::tags::TagError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    AcoustId(#[from] AcoustIdError),

    #[error(transparent)]
    Tags(#[from] TagError),

    /// The reason is part of the message, not the source chain.
    #[error("{reason} for <{}>", .path.display())]
    Unresolved { path: PathBuf, reason: IdentifyError },

    #[error(transparent)]
    Relocate(#[from] RelocateError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
