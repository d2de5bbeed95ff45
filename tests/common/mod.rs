//! Shared fixtures for the integration tests

#![allow(dead_code)]

use seqsim::bio::sequence::Sequence;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Small protein set with two near-identical members and one outlier
pub const PROTEINS: [&str; 4] = [
    "MKTAYIAKQRQISFVKSHFSRQ",
    "MKTAYIAKQRQISFVKSHFSRE",
    "GGGGSGGGGSGGGGS",
    "MKTAYLAKQRQVSFVKSHF",
];

pub fn protein_sequences() -> Vec<Sequence> {
    PROTEINS
        .iter()
        .enumerate()
        .map(|(i, s)| Sequence::new(i, s.as_bytes().to_vec()))
        .collect()
}

/// Deterministic pseudo-random protein of the given length
pub fn synthetic_protein(length: usize, seed: u64) -> Vec<u8> {
    const AMINO_ACIDS: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..length)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            AMINO_ACIDS[((state >> 33) % AMINO_ACIDS.len() as u64) as usize]
        })
        .collect()
}

/// Temporary working directory for a single test
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Write one sequence per line and return the file path
    pub fn write_sequences(&self, name: &str, sequences: &[&str]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, sequences.join("\n") + "\n").expect("Failed to write sequences");
        path
    }
}
