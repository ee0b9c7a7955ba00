use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of an introspection or extraction pass.
///
/// Every variant names the artifact or project root it failed on.
#[derive(Debug, Error)]
pub enum NodesError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize plugin options: {source}")]
    Options {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to fingerprint project {root}: {source}")]
    Fingerprint {
        root: String,
        #[source]
        source: anyhow::Error,
    },
}

impl NodesError {
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            NodesError::Read { path, .. }
            | NodesError::Parse { path, .. }
            | NodesError::Write { path, .. }
            | NodesError::Serialize { path, .. } => Some(path),
            NodesError::Options { .. } | NodesError::Fingerprint { .. } => None,
        }
    }
}
