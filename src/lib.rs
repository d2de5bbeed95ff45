pub mod bio;
pub mod cli;
pub mod core;
pub mod utils;

pub use crate::bio::alignment::{LocalAlignment, ScoringMatrix, SmithWaterman, SubstitutionMatrix};
pub use crate::core::similarity::{SimilarityBuilder, SimilarityMatrix};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqsimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Alignment of pair ({i}, {j}) failed: {message}")]
    Worker {
        i: usize,
        j: usize,
        message: String,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid distance matrix: {0}")]
    InvalidDistance(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<bincode::Error> for SeqsimError {
    fn from(err: bincode::Error) -> Self {
        SeqsimError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SeqsimError {
    fn from(err: serde_json::Error) -> Self {
        SeqsimError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SeqsimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let worker = SeqsimError::Worker {
            i: 2,
            j: 5,
            message: "too large".to_string(),
        };
        assert_eq!(
            format!("{}", worker),
            "Alignment of pair (2, 5) failed: too large"
        );

        let parse = SeqsimError::Parse("row 3".to_string());
        assert_eq!(format!("{}", parse), "Parse error: row 3");

        let not_found = SeqsimError::NotFound("blosum62.txt".to_string());
        assert_eq!(format!("{}", not_found), "Not found: blosum62.txt");

        assert_eq!(format!("{}", SeqsimError::Cancelled), "Operation cancelled");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SeqsimError = io.into();
        assert!(matches!(err, SeqsimError::Io(_)));
    }
}
