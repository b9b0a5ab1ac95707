//! Domain-level error taxonomy for RTL Agent.

/// RTL Agent domain errors.
///
/// Verification failures are not errors: they are ordinary results that
/// drive the refinement loop. Only conditions that stop an iteration (or the
/// caller) surface here.
#[derive(Debug, thiserror::Error)]
pub enum RtlAgentError {
    #[error("no valid module found in generated output; preview:\n{preview}")]
    EmptyOrMalformedArtifact { preview: String },

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("invalid verification mode: {0}")]
    InvalidMode(String),

    #[error("unknown example category: {0}")]
    InvalidCategory(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for RTL Agent domain operations.
pub type Result<T> = std::result::Result<T, RtlAgentError>;
