//! Smith-Waterman local alignment with a constant gap penalty

use crate::bio::alignment::scoring::ScoringMatrix;
use thiserror::Error;

/// Symbol emitted opposite an insertion or deletion
pub const GAP: u8 = b'-';

/// Gap penalty used when none is configured
pub const DEFAULT_GAP_PENALTY: f32 = -12.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LocalAlignment {
    pub score: f32,
    pub aligned_a: Vec<u8>,
    pub aligned_b: Vec<u8>,
    /// Half-open span of the first sequence covered by the alignment
    pub range_a: (usize, usize),
    /// Half-open span of the second sequence covered by the alignment
    pub range_b: (usize, usize),
}

impl LocalAlignment {
    fn empty() -> Self {
        Self {
            score: 0.0,
            aligned_a: Vec::new(),
            aligned_b: Vec::new(),
            range_a: (0, 0),
            range_b: (0, 0),
        }
    }

    pub fn len(&self) -> usize {
        self.aligned_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned_a.is_empty()
    }

    /// '|' for identical symbols, 'X' for substitutions, ' ' opposite a gap
    pub fn match_line(&self) -> Vec<u8> {
        self.aligned_a
            .iter()
            .zip(self.aligned_b.iter())
            .map(|(&a, &b)| {
                if a == GAP || b == GAP {
                    b' '
                } else if a == b {
                    b'|'
                } else {
                    b'X'
                }
            })
            .collect()
    }

    /// Fraction of alignment columns holding identical symbols
    pub fn identity(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let matches = self.match_line().iter().filter(|&&c| c == b'|').count();
        matches as f64 / self.len() as f64
    }

    pub fn gaps(&self) -> usize {
        self.aligned_a
            .iter()
            .chain(self.aligned_b.iter())
            .filter(|&&c| c == GAP)
            .count()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("dynamic programming matrix of {rows}x{cols} exceeds the {limit} cell limit")]
    TooLarge {
        rows: usize,
        cols: usize,
        limit: usize,
    },
}

// Tie order is the declaration order: diagonal, up, left, then stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Traceback {
    Stop,
    Diagonal,
    Up,
    Left,
}

pub struct SmithWaterman<S: ScoringMatrix> {
    scoring: S,
    gap_penalty: f32,
    max_cells: Option<usize>,
}

impl<S: ScoringMatrix> SmithWaterman<S> {
    /// `gap_penalty` is added per gap column, so it is normally negative
    pub fn new(scoring: S, gap_penalty: f32) -> Self {
        Self {
            scoring,
            gap_penalty,
            max_cells: None,
        }
    }

    /// Refuse pairs whose DP matrix would hold more than `max_cells` cells
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = Some(max_cells);
        self
    }

    pub fn gap_penalty(&self) -> f32 {
        self.gap_penalty
    }

    /// Like [`align`](Self::align) but honours the configured cell limit
    pub fn try_align(&self, seq_a: &[u8], seq_b: &[u8]) -> Result<LocalAlignment, AlignmentError> {
        self.check_size(seq_a.len(), seq_b.len())?;
        Ok(self.align(seq_a, seq_b))
    }

    /// Like [`score`](Self::score) but honours the configured cell limit
    pub fn try_score(&self, seq_a: &[u8], seq_b: &[u8]) -> Result<f32, AlignmentError> {
        self.check_size(seq_a.len(), seq_b.len())?;
        Ok(self.score(seq_a, seq_b))
    }

    pub fn align(&self, seq_a: &[u8], seq_b: &[u8]) -> LocalAlignment {
        let rows = seq_a.len() + 1;
        let cols = seq_b.len() + 1;

        // Row 0 and column 0 stay at zero
        let mut scores = vec![0f32; rows * cols];
        let mut traceback = vec![Traceback::Stop; rows * cols];

        let mut max_score = 0f32;
        let mut max_pos = (0, 0);

        for i in 1..rows {
            for j in 1..cols {
                let substitution = self.scoring.score(seq_a[i - 1], seq_b[j - 1]) as f32;
                let diagonal = scores[(i - 1) * cols + (j - 1)] + substitution;
                let up = scores[(i - 1) * cols + j] + self.gap_penalty;
                let left = scores[i * cols + (j - 1)] + self.gap_penalty;

                let (best, direction) = best_move(diagonal, up, left);
                scores[i * cols + j] = best;
                traceback[i * cols + j] = direction;

                if best > max_score {
                    max_score = best;
                    max_pos = (i, j);
                }
            }
        }

        if max_score <= 0.0 {
            return LocalAlignment::empty();
        }

        let (end_i, end_j) = max_pos;
        let (mut i, mut j) = max_pos;
        let mut aligned_a = Vec::new();
        let mut aligned_b = Vec::new();

        while i > 0 && j > 0 && scores[i * cols + j] > 0.0 {
            match traceback[i * cols + j] {
                Traceback::Diagonal => {
                    aligned_a.push(seq_a[i - 1]);
                    aligned_b.push(seq_b[j - 1]);
                    i -= 1;
                    j -= 1;
                }
                Traceback::Up => {
                    aligned_a.push(seq_a[i - 1]);
                    aligned_b.push(GAP);
                    i -= 1;
                }
                Traceback::Left => {
                    aligned_a.push(GAP);
                    aligned_b.push(seq_b[j - 1]);
                    j -= 1;
                }
                Traceback::Stop => break,
            }
        }

        aligned_a.reverse();
        aligned_b.reverse();

        LocalAlignment {
            score: max_score,
            aligned_a,
            aligned_b,
            range_a: (i, end_i),
            range_b: (j, end_j),
        }
    }

    /// Best local score only, using two rolling rows instead of the full matrix.
    ///
    /// Fills cells in the same order with the same recurrence as
    /// [`align`](Self::align), so both return bit-identical scores.
    pub fn score(&self, seq_a: &[u8], seq_b: &[u8]) -> f32 {
        let cols = seq_b.len() + 1;
        let mut previous = vec![0f32; cols];
        let mut current = vec![0f32; cols];
        let mut max_score = 0f32;

        for &a in seq_a {
            current[0] = 0.0;
            for j in 1..cols {
                let diagonal = previous[j - 1] + self.scoring.score(a, seq_b[j - 1]) as f32;
                let up = previous[j] + self.gap_penalty;
                let left = current[j - 1] + self.gap_penalty;

                let (best, _) = best_move(diagonal, up, left);
                current[j] = best;
                if best > max_score {
                    max_score = best;
                }
            }
            std::mem::swap(&mut previous, &mut current);
        }

        max_score
    }

    fn check_size(&self, len_a: usize, len_b: usize) -> Result<(), AlignmentError> {
        let Some(limit) = self.max_cells else {
            return Ok(());
        };
        let rows = len_a + 1;
        let cols = len_b + 1;
        match rows.checked_mul(cols) {
            Some(cells) if cells <= limit => Ok(()),
            _ => Err(AlignmentError::TooLarge { rows, cols, limit }),
        }
    }
}

fn best_move(diagonal: f32, up: f32, left: f32) -> (f32, Traceback) {
    let best = 0f32.max(diagonal).max(up).max(left);
    let direction = if best <= 0.0 {
        Traceback::Stop
    } else if diagonal == best {
        Traceback::Diagonal
    } else if up == best {
        Traceback::Up
    } else {
        Traceback::Left
    };
    (best, direction)
}
