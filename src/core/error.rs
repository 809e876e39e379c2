//! Error types for stablescan

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// A point index collides with (or exceeds) the EMPTY picking sentinel
    #[error("Index space exhausted: point index {0} cannot be encoded")]
    IndexSpaceExhausted(u64),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// The depth buffer holds no rendered sample
    #[error("Empty depth range: no point was rendered")]
    EmptyDepthRange,

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// An index (or a capture) predates the last prune/reset of the store
    #[error("Stale index reference: {0}")]
    StaleIndexReference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl Error {
    /// Whether this error is part of normal operation (operator cancel,
    /// offline service, empty view) rather than a programming error.
    pub fn is_expected(&self) -> bool {
        matches!(self, Error::GenerationFailed(_) | Error::EmptyDepthRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_errors() {
        assert!(Error::EmptyDepthRange.is_expected());
        assert!(Error::GenerationFailed("offline".into()).is_expected());
        assert!(!Error::IndexSpaceExhausted(u32::MAX as u64).is_expected());
        assert!(!Error::StaleIndexReference("old".into()).is_expected());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("missing"));
    }
}
