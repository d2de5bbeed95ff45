pub mod alignment;
pub mod sequence;

pub use sequence::{load_sequences, parse_sequences, Sequence};
