pub mod scoring;
pub mod smith_waterman;

pub use scoring::{ScoringMatrix, SubstitutionMatrix, DEFAULT_UNKNOWN_SCORE};
pub use smith_waterman::{AlignmentError, LocalAlignment, SmithWaterman, DEFAULT_GAP_PENALTY, GAP};
