//! Average-linkage (UPGMA) clustering over a similarity matrix
//!
//! Similarities are turned into distances as `1 - s`, which only makes sense
//! while every similarity lies in [0, 1]; anything outside is rejected.

use crate::core::similarity::SimilarityMatrix;
use crate::{Result, SeqsimError};
use serde::Serialize;
use tracing::{debug, info};

/// One agglomeration step; ids below the leaf count are leaves, the rest
/// refer to earlier merges (leaf count + merge index)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Linkage {
    leaves: usize,
    merges: Vec<Merge>,
}

impl Linkage {
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    fn height_of(&self, id: usize) -> f64 {
        if id < self.leaves {
            0.0
        } else {
            self.merges[id - self.leaves].height
        }
    }

    /// Leaves in left-to-right dendrogram order
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.leaves);
        let Some(root) = self.root() else {
            return order;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id < self.leaves {
                order.push(id);
            } else {
                let merge = &self.merges[id - self.leaves];
                stack.push(merge.right);
                stack.push(merge.left);
            }
        }
        order
    }

    fn root(&self) -> Option<usize> {
        match self.leaves {
            0 => None,
            1 => Some(0),
            n => Some(n + self.merges.len() - 1),
        }
    }

    /// Newick rendering with ultrametric branch lengths (half the merge distance)
    pub fn to_newick(&self, labels: &[String]) -> Result<String> {
        if labels.len() != self.leaves {
            return Err(SeqsimError::InvalidInput(format!(
                "{} labels for {} leaves",
                labels.len(),
                self.leaves
            )));
        }
        let Some(root) = self.root() else {
            return Ok(";".to_string());
        };

        let mut out = String::new();
        self.write_node(root, labels, &mut out);
        out.push(';');
        Ok(out)
    }

    fn write_node(&self, id: usize, labels: &[String], out: &mut String) {
        if id < self.leaves {
            out.push_str(&newick_label(&labels[id]));
            return;
        }

        let merge = &self.merges[id - self.leaves];
        out.push('(');
        for (k, child) in [merge.left, merge.right].into_iter().enumerate() {
            if k > 0 {
                out.push(',');
            }
            self.write_node(child, labels, out);
            let branch = (merge.height - self.height_of(child)) / 2.0;
            out.push_str(&format!(":{:.6}", branch));
        }
        out.push(')');
    }
}

/// Default leaf labels, `Seq 0`, `Seq 1`, ...
pub fn default_labels(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Seq {}", i)).collect()
}

/// Symmetrized `1 - s` distances with a zero diagonal
pub fn distance_matrix(similarity: &SimilarityMatrix) -> Result<Vec<Vec<f64>>> {
    let n = similarity.size();
    let mut dist = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let d = ((1.0 - similarity.get(i, j)) + (1.0 - similarity.get(j, i))) / 2.0;
            if !(0.0..=1.0).contains(&d) {
                return Err(SeqsimError::InvalidDistance(format!(
                    "distance {:.6} between {} and {} is outside [0, 1]",
                    d, i, j
                )));
            }
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    Ok(dist)
}

/// Cluster with unweighted average linkage.
///
/// The closest pair of active clusters is merged at each step; ties go to the
/// first pair in row-major order over the active clusters.
pub fn upgma(similarity: &SimilarityMatrix) -> Result<Linkage> {
    let n = similarity.size();
    if n == 0 {
        return Err(SeqsimError::InsufficientData(
            "cannot cluster an empty matrix".to_string(),
        ));
    }

    let mut dist = distance_matrix(similarity)?;
    let mut active: Vec<usize> = (0..n).collect();
    let mut sizes: Vec<usize> = vec![1; n];
    let mut merges = Vec::with_capacity(n - 1);

    info!("Clustering {} sequences with UPGMA", n);

    while active.len() > 1 {
        let (mut a, mut b) = (0, 1);
        let mut min_dist = dist[0][1];
        for i in 0..active.len() {
            for j in (i + 1)..active.len() {
                if dist[i][j] < min_dist {
                    min_dist = dist[i][j];
                    a = i;
                    b = j;
                }
            }
        }

        let (size_a, size_b) = (sizes[a], sizes[b]);
        let merged_size = size_a + size_b;
        for k in 0..active.len() {
            if k == a || k == b {
                continue;
            }
            let d = (dist[a][k] * size_a as f64 + dist[b][k] * size_b as f64) / merged_size as f64;
            dist[a][k] = d;
            dist[k][a] = d;
        }

        let (id_a, id_b) = (active[a], active[b]);
        merges.push(Merge {
            left: id_a.min(id_b),
            right: id_a.max(id_b),
            height: min_dist,
            size: merged_size,
        });
        debug!("Merged clusters {} and {} at {:.4}", id_a, id_b, min_dist);

        // The merged cluster takes slot `a`; slot `b` is dropped
        active[a] = n + merges.len() - 1;
        sizes[a] = merged_size;
        active.remove(b);
        sizes.remove(b);
        dist.remove(b);
        for row in dist.iter_mut() {
            row.remove(b);
        }
    }

    Ok(Linkage { leaves: n, merges })
}

fn newick_label(label: &str) -> String {
    let needs_quotes = label
        .chars()
        .any(|c| c.is_whitespace() || "()[]':;,".contains(c));
    if needs_quotes {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
