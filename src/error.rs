//! Error taxonomy for probe authoring.
//!
//! Catalog and pre-flight errors are fatal to an authoring action; path errors
//! raised while committing a probe are downgraded to session warnings by the
//! caller. Codec errors abort the read or write that raised them.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthorError {
    #[error("module definition {origin} is malformed: {detail}")]
    MalformedCatalog { origin: String, detail: String },

    #[error("no module definitions found under {}", .0.display())]
    NoModuleDefinitions(PathBuf),

    #[error("SAAD directory not found under {} (the project must contain a SAAD directory)", .0.display())]
    MissingSaadDirectory(PathBuf),

    #[error("unable to locate a project containing a SAAD directory; pass --project or set SAAD_PROJECT_ROOT")]
    ProjectRootNotFound,

    #[error("{} is outside the project root {}", .path.display(), .root.display())]
    PathOutsideProject { path: PathBuf, root: PathBuf },

    #[error("probe file {origin} is malformed: {detail}")]
    MalformedProbeFile { origin: String, detail: String },

    #[error("invalid probe file name '{0}'")]
    InvalidProbeFileName(String),

    #[error("probe name must not be empty")]
    InvalidProbeName,

    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("probe session is already finished")]
    SessionClosed,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode probes: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AuthorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuthorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Advisory problems noticed while authoring. They never fail a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionWarning {
    /// Another probe in the same session already uses this name.
    DuplicateProbeName(String),
    /// The file field of `probe` was dropped because it could not be stored.
    FileDropped { probe: String, reason: String },
}

impl std::fmt::Display for SessionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionWarning::DuplicateProbeName(name) => {
                write!(
                    f,
                    "probe name '{name}' is used more than once; references to {{{name}}} are ambiguous"
                )
            }
            SessionWarning::FileDropped { probe, reason } => {
                write!(f, "file for probe '{probe}' was not stored: {reason}")
            }
        }
    }
}
