use expertkit_core::error::ExpertError;
use expertkit_validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum TransformerError {
    #[error(transparent)]
    Expert(#[from] ExpertError),

    /// The transform phase was started from a mapping task with no report.
    #[error("Mapping task {0} has no mapping report")]
    MissingMapping(String),

    #[error("Sandbox setup failed: {0}")]
    Sandbox(#[from] ValidationError),
}
