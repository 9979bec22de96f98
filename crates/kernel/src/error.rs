//! Kernel error types.

use thiserror::Error;

/// Errors raised by repository, menu and content operations.
///
/// Lookups that find nothing return `Ok(None)` instead of an error.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The caller passed something the operation cannot work with,
    /// e.g. content that has not been persisted yet.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A `Alias:Name` type tag used an alias with no registered namespace.
    #[error("unknown namespace alias: {0}")]
    UnknownNamespaceAlias(String),

    /// Backend or collaborator failure.
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias using NodeError.
pub type NodeResult<T> = Result<T, NodeError>;
