//! Error types for the verso decoder
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Configuration errors are fatal and reported before any sentence is
//! decoded. Per-sentence problems (no complete hypothesis, timeouts) are not
//! errors at all; they surface in the `Translation` result instead.

use std::io;
use thiserror::Error;

/// Result type alias for verso operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the verso decoder
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (config files, phrase tables, language models)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required configuration section is absent
    #[error("Missing required configuration section: {0}")]
    MissingSection(String),

    /// Feature type not known to the factory
    #[error("Unknown feature function: {0}")]
    UnknownFeature(String),

    /// Weight line does not match the feature's score count
    #[error("Malformed weights for {feature}: expected {expected} values, got {actual}")]
    MalformedWeights {
        /// Feature name
        feature: String,
        /// Number of score slots the feature declares
        expected: usize,
        /// Number of weights supplied
        actual: usize,
    },

    /// Phrase table line could not be parsed
    #[error("Phrase table error at line {line}: {reason}")]
    PhraseTable {
        /// 1-based line number
        line: usize,
        /// What went wrong
        reason: String,
    },

    /// Language model file could not be parsed
    #[error("Language model error at line {line}: {reason}")]
    LanguageModel {
        /// 1-based line number
        line: usize,
        /// What went wrong
        reason: String,
    },

    /// A result could not be rendered
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Write-once score slot was written twice
    #[error("Score slot at offset {offset} is already assigned")]
    ScoreSlotOccupied {
        /// Global offset of the first occupied slot
        offset: usize,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
    }

    #[test]
    fn test_error_display_missing_section() {
        let err = Error::MissingSection("weights".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Missing required configuration section"));
        assert!(msg.contains("weights"));
    }

    #[test]
    fn test_error_display_unknown_feature() {
        let err = Error::UnknownFeature("Bogus".to_string());
        assert!(err.to_string().contains("Bogus"));
    }

    #[test]
    fn test_error_display_malformed_weights() {
        let err = Error::MalformedWeights {
            feature: "Distortion0".to_string(),
            expected: 1,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Distortion0"));
        assert!(msg.contains("expected 1"));
        assert!(msg.contains("got 3"));
    }

    #[test]
    fn test_error_display_phrase_table() {
        let err = Error::PhraseTable {
            line: 7,
            reason: "missing separator".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("missing separator"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
