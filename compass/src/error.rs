//! Compass Error Types
//!
//! [`CompassError`] covers every failure the engine can surface. Not every variant is
//! fatal: parse-related variants (`Json`, `UnsupportedDiagramType`, `InvalidModel`,
//! `MissingField`) are produced by the diagram parser and are recovered locally by the
//! orchestrator, which treats an unparsable submission as "no suggestion possible".
//! Storage failures and cluster-integrity violations are always propagated.

use sea_orm::DbErr;

/// Result type for engine operations.
pub type CompassResult<T> = Result<T, CompassError>;

#[derive(Debug, thiserror::Error)]
pub enum CompassError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported diagram type: {0}")]
    UnsupportedDiagramType(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    /// An element points at a cluster that does not exist, or a cluster has no members.
    #[error("Cluster integrity violation: {0}")]
    ClusterIntegrity(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl CompassError {
    /// Errors that only mean "this submission cannot be read".
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            CompassError::Json(_)
                | CompassError::UnsupportedDiagramType(_)
                | CompassError::InvalidModel(_)
                | CompassError::MissingField(_)
        )
    }
}
