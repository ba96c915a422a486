use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Syntax,
    Resolve,
    Invoke,
    OutputShape,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Syntax => write!(f, "syntax"),
            Stage::Resolve => write!(f, "resolve"),
            Stage::Invoke => write!(f, "invoke"),
            Stage::OutputShape => write!(f, "output_shape"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Artifact is not a valid module: {0}")]
    InvalidSyntax(String),

    #[error("Artifact does not export '{0}'")]
    EntryPointMissing(String),

    #[error("Export '{name}' cannot be called as an entry point: {reason}")]
    EntryPointNotCallable { name: String, reason: String },

    #[error("Artifact failed to load: {0}")]
    LoadFailed(String),

    #[error("Artifact failed while running: {0}")]
    ArtifactFailed(String),

    #[error("Artifact output has the wrong shape: {0}")]
    OutputShapeMismatch(String),
}

impl ValidationError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidSyntax(_) => Stage::Syntax,
            Self::EntryPointMissing(_) | Self::EntryPointNotCallable { .. } | Self::LoadFailed(_) => {
                Stage::Resolve
            }
            Self::ArtifactFailed(_) => Stage::Invoke,
            Self::OutputShapeMismatch(_) => Stage::OutputShape,
        }
    }
}
