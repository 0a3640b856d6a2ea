//! Analysis error types

use thiserror::Error;

/// Errors raised by windowed computations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Window length must be at least one day
    #[error("Invalid window: {0} days (must be at least 1)")]
    InvalidWindow(usize),
}

/// Result type alias for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
