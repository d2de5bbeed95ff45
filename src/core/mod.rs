pub mod cache;
pub mod clustering;
pub mod config;
pub mod extremes;
pub mod paths;
pub mod similarity;

pub use cache::{FileMatrixCache, MatrixCache, MemoryMatrixCache};
pub use clustering::{upgma, Linkage, Merge};
pub use config::Config;
pub use extremes::{find_extremes, PairScore};
pub use similarity::{SimilarityBuilder, SimilarityMatrix};
