use thiserror::Error;

/// Crate-level error taxonomy.
///
/// Timeouts are deliberately not errors: an exceeded deadline degrades to a
/// partial result carried in flags (see [`crate::routing::LegPaths`]), so
/// only conditions that abort a request appear here.
#[derive(Error, Debug)]
pub enum Error {
    /// A request location could not be resolved to a graph vertex. Fatal,
    /// propagated to the caller unchanged.
    #[error("vertex not found: {0}")]
    VertexNotFound(String),
    /// The search completed but produced no valid path, after any permitted
    /// relaxation. Fatal for the leg it occurred on.
    #[error("path not found: {0}")]
    PathNotFound(String),
    /// A search produced neither paths nor an abort signal, breaking the
    /// single-leg contract. Not expected in normal operation; logged at
    /// error level where detected.
    #[error("search engine returned no result structure")]
    InternalSearchFailure,
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
