//! Closest and farthest sequence pairs in a similarity matrix

use crate::core::similarity::SimilarityMatrix;
use crate::{Result, SeqsimError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScore {
    pub i: usize,
    pub j: usize,
    pub score: f64,
}

/// Most and least similar pair over the upper triangle.
///
/// Pairs are visited in row-major order and ties keep the first pair seen.
pub fn find_extremes(matrix: &SimilarityMatrix) -> Result<(PairScore, PairScore)> {
    let n = matrix.size();
    if n < 2 {
        return Err(SeqsimError::InsufficientData(format!(
            "need at least 2 sequences to compare, got {}",
            n
        )));
    }

    let first = PairScore {
        i: 0,
        j: 1,
        score: matrix.get(0, 1),
    };
    let mut closest = first;
    let mut farthest = first;

    for i in 0..n {
        for j in (i + 1)..n {
            let score = matrix.get(i, j);
            if score > closest.score {
                closest = PairScore { i, j, score };
            }
            if score < farthest.score {
                farthest = PairScore { i, j, score };
            }
        }
    }

    Ok((closest, farthest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_by_three() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.1],
            vec![0.9, 1.0, 0.5],
            vec![0.1, 0.5, 1.0],
        ])
        .unwrap();

        let (closest, farthest) = find_extremes(&matrix).unwrap();
        assert_eq!(closest, PairScore { i: 0, j: 1, score: 0.9 });
        assert_eq!(farthest, PairScore { i: 0, j: 2, score: 0.1 });
    }

    #[test]
    fn test_ties_keep_first_pair() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.5, 0.5],
            vec![0.5, 1.0, 0.5],
            vec![0.5, 0.5, 1.0],
        ])
        .unwrap();

        let (closest, farthest) = find_extremes(&matrix).unwrap();
        assert_eq!((closest.i, closest.j), (0, 1));
        assert_eq!((farthest.i, farthest.j), (0, 1));
    }

    #[test]
    fn test_diagonal_is_ignored() {
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0, 0.2], vec![0.2, 1.0]]).unwrap();
        let (closest, farthest) = find_extremes(&matrix).unwrap();
        assert_eq!(closest.score, 0.2);
        assert_eq!(farthest.score, 0.2);
    }

    #[test]
    fn test_too_small() {
        assert!(matches!(
            find_extremes(&SimilarityMatrix::identity(1)),
            Err(SeqsimError::InsufficientData(_))
        ));
        assert!(find_extremes(&SimilarityMatrix::identity(0)).is_err());
    }
}
