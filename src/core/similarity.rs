//! All-pairs similarity matrix construction
//!
//! Every sequence is aligned against itself and against every other sequence
//! with Smith-Waterman. Pair scores are normalized by the geometric mean of the
//! two self-alignment scores:
//!
//! ```text
//! similarity(i, j) = raw(i, j) / sqrt(self(i) * self(j))
//! ```
//!
//! Values are not clamped, so a cross-alignment that outscores a
//! self-alignment yields a similarity above 1.

use crate::bio::alignment::{AlignmentError, SmithWaterman, SubstitutionMatrix};
use crate::core::cache::{FileMatrixCache, MatrixCache};
use crate::core::config::Config;
use crate::utils::parallel::{build_pool, pair_count, upper_triangle_pairs};
use crate::utils::progress::create_progress_bar;
use crate::{Result, SeqsimError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Square symmetric matrix of normalized similarities with a unit diagonal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSimilarityMatrix")]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

// Deserialized form, checked by `from_raw` before it becomes a matrix
#[derive(Deserialize)]
struct RawSimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl TryFrom<RawSimilarityMatrix> for SimilarityMatrix {
    type Error = SeqsimError;

    fn try_from(raw: RawSimilarityMatrix) -> Result<Self> {
        Self::from_raw(raw.size, raw.values)
    }
}

impl SimilarityMatrix {
    /// `n` x `n` matrix with ones on the diagonal and zeros elsewhere
    pub fn identity(n: usize) -> Self {
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        Self { size: n, values }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(SeqsimError::Parse(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            values.extend(row);
        }
        Ok(Self { size, values })
    }

    pub(crate) fn from_raw(size: usize, values: Vec<f64>) -> Result<Self> {
        if size.checked_mul(size) != Some(values.len()) {
            return Err(SeqsimError::Parse(format!(
                "{} values cannot form a {}x{} matrix",
                values.len(),
                size,
                size
            )));
        }
        Ok(Self { size, values })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Write `value` to both (i, j) and (j, i)
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks(0) panics, and an empty matrix has no rows anyway
        self.values.chunks(self.size.max(1))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (i + 1..self.size).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Tab-separated rendering, one matrix row per line
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(std::fs::File::create(path)?);
        for row in self.rows() {
            let line: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
            writeln!(writer, "{}", line.join("\t"))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let rows: Vec<&[f64]> = self.rows().collect();
        Ok(serde_json::to_string(&rows)?)
    }
}

/// Runs the all-pairs alignment batch on a dedicated worker pool.
///
/// The substitution matrix is borrowed for the lifetime of the builder and
/// shared read-only by every worker.
pub struct SimilarityBuilder<'a> {
    matrix: &'a SubstitutionMatrix,
    gap_penalty: f32,
    max_workers: usize,
    chunk_size: usize,
    max_cells: Option<usize>,
    show_progress: bool,
    abort: Option<Arc<AtomicBool>>,
}

impl<'a> SimilarityBuilder<'a> {
    pub fn new(matrix: &'a SubstitutionMatrix, gap_penalty: f32) -> Self {
        Self {
            matrix,
            gap_penalty,
            max_workers: 10,
            chunk_size: 10,
            max_cells: None,
            show_progress: false,
            abort: None,
        }
    }

    pub fn from_config(matrix: &'a SubstitutionMatrix, config: &Config) -> Self {
        Self::new(matrix, config.alignment.gap_penalty)
            .with_max_workers(config.performance.max_workers)
            .with_chunk_size(config.performance.chunk_size)
            .with_max_cells(config.performance.max_cells)
            .with_progress(config.performance.show_progress)
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = Some(max_cells);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Abort the batch once `flag` is set; nothing is persisted for an aborted build
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn gap_penalty(&self) -> f32 {
        self.gap_penalty
    }

    /// Return the matrix stored under `key`, computing and storing it on a miss.
    ///
    /// A hit is returned as-is without looking at `sequences`.
    pub fn build<S>(
        &self,
        sequences: &[S],
        cache: &dyn MatrixCache,
        key: &str,
    ) -> Result<SimilarityMatrix>
    where
        S: AsRef<[u8]> + Sync,
    {
        if cache.exists(key) {
            info!("Loading pre-computed similarity matrix from {}", key);
            let matrix = cache.load(key)?;
            debug!("Cached matrix covers {} sequences", matrix.size());
            return Ok(matrix);
        }

        let matrix = self.compute(sequences)?;
        cache.store(key, &matrix)?;
        info!("Saved similarity matrix to {}", key);
        Ok(matrix)
    }

    /// [`build`](Self::build) against a single file; an existing file always wins
    pub fn build_at<S, P>(&self, sequences: &[S], path: P) -> Result<SimilarityMatrix>
    where
        S: AsRef<[u8]> + Sync,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                SeqsimError::Config(format!("{} is not a file path", path.display()))
            })?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        self.build(sequences, &FileMatrixCache::new(dir), name)
    }

    /// Content key over every input that affects the matrix
    pub fn cache_key<S: AsRef<[u8]>>(&self, sequences: &[S]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"seqsim-similarity-v1");
        hasher.update(self.gap_penalty.to_le_bytes());
        hasher.update(self.matrix.default_score().to_le_bytes());
        hasher.update((self.matrix.size() as u64).to_le_bytes());
        hasher.update(self.matrix.alphabet());
        for score in self.matrix.table() {
            hasher.update(score.to_le_bytes());
        }
        hasher.update((sequences.len() as u64).to_le_bytes());
        for sequence in sequences {
            let residues = sequence.as_ref();
            hasher.update((residues.len() as u64).to_le_bytes());
            hasher.update(residues);
        }
        hex::encode(&hasher.finalize()[..8])
    }

    /// Compute the matrix without consulting any cache
    pub fn compute<S>(&self, sequences: &[S]) -> Result<SimilarityMatrix>
    where
        S: AsRef<[u8]> + Sync,
    {
        let n = sequences.len();
        let mut matrix = SimilarityMatrix::identity(n);
        if n < 2 {
            debug!("{} sequence(s), no pairs to align", n);
            return Ok(matrix);
        }

        let start = Instant::now();
        let pool = build_pool(self.max_workers)
            .map_err(|e| SeqsimError::Config(format!("Failed to build worker pool: {}", e)))?;
        info!(
            "Aligning {} sequences ({} pairs) on {} worker threads",
            n,
            pair_count(n),
            pool.current_num_threads()
        );

        let mut aligner = SmithWaterman::new(self.matrix, self.gap_penalty);
        if let Some(limit) = self.max_cells {
            aligner = aligner.with_max_cells(limit);
        }

        let self_scores = self.self_alignments(&pool, &aligner, sequences)?;
        let raw_scores = self.pair_alignments(&pool, &aligner, sequences)?;

        for (i, j, raw) in raw_scores.into_iter().flatten() {
            matrix.set_symmetric(i, j, normalize(raw, self_scores[i], self_scores[j]));
        }

        info!(
            "Similarity matrix for {} sequences finished in {:.2}s",
            n,
            start.elapsed().as_secs_f64()
        );
        Ok(matrix)
    }

    fn self_alignments<S>(
        &self,
        pool: &rayon::ThreadPool,
        aligner: &SmithWaterman<&SubstitutionMatrix>,
        sequences: &[S],
    ) -> Result<Vec<f64>>
    where
        S: AsRef<[u8]> + Sync,
    {
        let pb = create_progress_bar(sequences.len() as u64, "Self alignments", self.show_progress);

        let scores = pool.install(|| {
            sequences
                .par_iter()
                .enumerate()
                .map(|(i, sequence)| {
                    self.check_abort()?;
                    let residues = sequence.as_ref();
                    let score = aligner
                        .try_score(residues, residues)
                        .map_err(|e| worker_failure(i, i, e))?;
                    pb.inc(1);
                    Ok(f64::from(score.max(0.0)))
                })
                .collect::<Result<Vec<_>>>()
        });

        pb.finish_and_clear();
        scores
    }

    fn pair_alignments<S>(
        &self,
        pool: &rayon::ThreadPool,
        aligner: &SmithWaterman<&SubstitutionMatrix>,
        sequences: &[S],
    ) -> Result<Vec<Vec<(usize, usize, f32)>>>
    where
        S: AsRef<[u8]> + Sync,
    {
        let pairs = upper_triangle_pairs(sequences.len());
        let pb = create_progress_bar(
            pairs.len() as u64,
            "Pairwise alignments",
            self.show_progress,
        );
        debug!(
            "Dispatching {} pairs in chunks of {}",
            pairs.len(),
            self.chunk_size
        );

        let scores = pool.install(|| {
            pairs
                .par_chunks(self.chunk_size)
                .map(|chunk| {
                    self.check_abort()?;
                    let scored = chunk
                        .iter()
                        .map(|&(i, j)| {
                            aligner
                                .try_score(sequences[i].as_ref(), sequences[j].as_ref())
                                .map(|score| (i, j, score.max(0.0)))
                                .map_err(|e| worker_failure(i, j, e))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    pb.inc(chunk.len() as u64);
                    Ok(scored)
                })
                .collect::<Result<Vec<_>>>()
        });

        pb.finish_and_clear();
        scores
    }

    fn check_abort(&self) -> Result<()> {
        match &self.abort {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(SeqsimError::Cancelled),
            _ => Ok(()),
        }
    }
}

fn normalize(raw: f32, self_i: f64, self_j: f64) -> f64 {
    let denominator = (self_i * self_j).sqrt();
    if denominator > 0.0 {
        f64::from(raw) / denominator
    } else {
        0.0
    }
}

fn worker_failure(i: usize, j: usize, err: AlignmentError) -> SeqsimError {
    SeqsimError::Worker {
        i,
        j,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::MemoryMatrixCache;

    fn two_letter() -> SubstitutionMatrix {
        "   A  B\nA  2 -1\nB -1  2\n".parse().unwrap()
    }

    #[test]
    fn test_identity_diagonal() {
        let matrix = SimilarityMatrix::identity(3);
        assert_eq!(matrix.get(1, 1), 1.0);
        assert_eq!(matrix.get(0, 2), 0.0);
        assert_eq!(matrix.rows().count(), 3);
        assert_eq!(SimilarityMatrix::identity(0).rows().count(), 0);
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let err = SimilarityMatrix::from_rows(vec![vec![1.0, 0.5], vec![0.5]]).unwrap_err();
        assert!(matches!(err, SeqsimError::Parse(_)));
    }

    #[test]
    fn test_single_sequence() {
        let scoring = two_letter();
        let builder = SimilarityBuilder::new(&scoring, -1.0);
        let matrix = builder.compute(&["AAB"]).unwrap();
        assert_eq!(matrix.size(), 1);
        assert_eq!(matrix.get(0, 0), 1.0);
    }

    #[test]
    fn test_normalization_by_self_scores() {
        let scoring = two_letter();
        let builder = SimilarityBuilder::new(&scoring, -1.0).with_max_workers(2);
        // self scores: AAAA = 8, AA = 4; cross = 4
        let matrix = builder.compute(&["AAAA", "AA", "BBBB"]).unwrap();

        let expected = 4.0 / (8.0f64 * 4.0).sqrt();
        assert!((matrix.get(0, 1) - expected).abs() < 1e-12);
        assert_eq!(matrix.get(1, 0), matrix.get(0, 1));
        assert_eq!(matrix.get(0, 2), 0.0);
        assert_eq!(matrix.get(2, 2), 1.0);
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn test_zero_self_score_gives_zero_similarity() {
        let scoring = two_letter();
        let builder = SimilarityBuilder::new(&scoring, -1.0);
        let matrix = builder.compute(&["AAB", "??"]).unwrap();
        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.get(1, 1), 1.0);
    }

    #[test]
    fn test_similarity_can_exceed_one() {
        // Substitutions outscore identities under this matrix
        let scoring: SubstitutionMatrix = "   A  B\nA  2  3\nB  3  2\n".parse().unwrap();
        let builder = SimilarityBuilder::new(&scoring, -5.0);
        let matrix = builder.compute(&["AAAA", "BBBB"]).unwrap();
        assert!((matrix.get(0, 1) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_worker_failure_names_pair() {
        let scoring = two_letter();
        let builder = SimilarityBuilder::new(&scoring, -1.0).with_max_cells(30);
        let err = builder.compute(&["AA", "AAAAAAAA"]).unwrap_err();
        match err {
            SeqsimError::Worker { i, j, .. } => assert_eq!((i, j), (1, 1)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_abort_flag_cancels_without_storing() {
        let scoring = two_letter();
        let flag = Arc::new(AtomicBool::new(true));
        let builder = SimilarityBuilder::new(&scoring, -1.0).with_abort_flag(flag);
        let cache = MemoryMatrixCache::new();

        let err = builder.build(&["AAB", "ABB"], &cache, "k").unwrap_err();
        assert!(matches!(err, SeqsimError::Cancelled));
        assert!(!cache.exists("k"));
    }

    #[test]
    fn test_build_stores_then_hits_cache() {
        let scoring = two_letter();
        let builder = SimilarityBuilder::new(&scoring, -1.0);
        let cache = MemoryMatrixCache::new();

        let first = builder.build(&["AAB", "ABB"], &cache, "pair").unwrap();
        assert!(cache.exists("pair"));

        // Cache wins even though the input changed
        let second = builder.build(&["BBBB"], &cache, "pair").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_key_tracks_inputs() {
        let scoring = two_letter();
        let builder = SimilarityBuilder::new(&scoring, -1.0);
        let key = builder.cache_key(&["AAB", "ABB"]);

        assert_eq!(key, builder.cache_key(&["AAB", "ABB"]));
        assert_eq!(key.len(), 16);
        assert_ne!(key, builder.cache_key(&["AAB", "ABA"]));
        assert_ne!(key, builder.cache_key(&["AABABB"]));
        assert_ne!(
            key,
            SimilarityBuilder::new(&scoring, -2.0).cache_key(&["AAB", "ABB"])
        );
    }

    #[test]
    fn test_json_export() {
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        assert_eq!(matrix.to_json().unwrap(), "[[1.0,0.5],[0.5,1.0]]");
    }

    #[test]
    fn test_deserialize_checks_dimensions() {
        let matrix: SimilarityMatrix =
            serde_json::from_str(r#"{"size":2,"values":[1.0,0.5,0.5,1.0]}"#).unwrap();
        assert_eq!(matrix.get(1, 0), 0.5);

        let ragged = serde_json::from_str::<SimilarityMatrix>(r#"{"size":3,"values":[1.0]}"#);
        assert!(ragged.is_err());
    }
}
