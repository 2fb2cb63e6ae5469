//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent violations of the font tree model.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("font root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("no tree node for path: {0}")]
    NodeNotFound(PathBuf),

    #[error("invalid font extension pattern '{pattern}': {message}")]
    InvalidFontPattern { pattern: String, message: String },
}
