//! Substitution matrices for local alignment scoring

use crate::{Result, SeqsimError};
use std::path::Path;
use std::str::FromStr;

/// Score returned for any pair involving a symbol outside the matrix alphabet
pub const DEFAULT_UNKNOWN_SCORE: i32 = -4;

const COMMENT_MARKER: char = '#';
const NO_INDEX: usize = usize::MAX;

static BLOSUM62_RESOURCE: &str = include_str!("../../../data/blosum62.txt");

pub trait ScoringMatrix {
    fn score(&self, a: u8, b: u8) -> i32;
}

impl<T: ScoringMatrix + ?Sized> ScoringMatrix for &T {
    fn score(&self, a: u8, b: u8) -> i32 {
        (**self).score(a, b)
    }
}

/// Dense square score table keyed by single-byte symbols.
///
/// Built once from a text resource and shared read-only by every alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionMatrix {
    alphabet: Vec<u8>,
    index: Box<[usize; 256]>,
    table: Vec<i32>,
    default_score: i32,
}

impl SubstitutionMatrix {
    /// The BLOSUM62 matrix bundled with the crate
    pub fn blosum62() -> Result<Self> {
        BLOSUM62_RESOURCE.parse()
    }

    /// Load a matrix from a whitespace-separated text file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SeqsimError::NotFound(format!("substitution matrix {}", path.display()))
            } else {
                SeqsimError::Io(e)
            }
        })?;

        let matrix = contents
            .parse::<Self>()
            .map_err(|e| match e {
                SeqsimError::Parse(msg) => {
                    SeqsimError::Parse(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })?;

        tracing::debug!(
            "Loaded {}x{} substitution matrix from {}",
            matrix.size(),
            matrix.size(),
            path.display()
        );
        Ok(matrix)
    }

    pub fn with_default_score(mut self, default_score: i32) -> Self {
        self.default_score = default_score;
        self
    }

    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    pub fn size(&self) -> usize {
        self.alphabet.len()
    }

    pub fn default_score(&self) -> i32 {
        self.default_score
    }

    pub fn index_of(&self, symbol: u8) -> Option<usize> {
        match self.index[symbol as usize] {
            NO_INDEX => None,
            idx => Some(idx),
        }
    }

    /// Raw table lookup by row and column index
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.table[row * self.alphabet.len() + col]
    }

    /// Row-major score table
    pub fn table(&self) -> &[i32] {
        &self.table
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.size();
        (0..n).all(|i| (i + 1..n).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

impl ScoringMatrix for SubstitutionMatrix {
    fn score(&self, a: u8, b: u8) -> i32 {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.get(i, j),
            _ => self.default_score,
        }
    }
}

impl FromStr for SubstitutionMatrix {
    type Err = SeqsimError;

    fn from_str(s: &str) -> Result<Self> {
        let mut lines = s
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.starts_with(COMMENT_MARKER) && !line.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| SeqsimError::Parse("missing alphabet header".to_string()))?;

        let mut alphabet = Vec::new();
        let mut index = Box::new([NO_INDEX; 256]);
        for token in header.split_whitespace() {
            let symbol = parse_symbol(token)?;
            if index[symbol as usize] != NO_INDEX {
                return Err(SeqsimError::Parse(format!(
                    "duplicate symbol '{}' in header",
                    token
                )));
            }
            index[symbol as usize] = alphabet.len();
            alphabet.push(symbol);
        }

        if alphabet.is_empty() {
            return Err(SeqsimError::Parse("empty alphabet header".to_string()));
        }

        let n = alphabet.len();
        let mut table = Vec::with_capacity(n * n);
        let mut rows = 0;

        for (line_no, line) in lines {
            if rows == n {
                return Err(SeqsimError::Parse(format!(
                    "line {}: more rows than the {} header symbols",
                    line_no + 1,
                    n
                )));
            }

            let mut fields = line.split_whitespace();
            let label = fields.next().map(parse_symbol).transpose()?;
            if label != Some(alphabet[rows]) {
                return Err(SeqsimError::Parse(format!(
                    "line {}: expected row '{}'",
                    line_no + 1,
                    alphabet[rows] as char
                )));
            }

            let before = table.len();
            for field in fields {
                let value = field.parse::<i32>().map_err(|_| {
                    SeqsimError::Parse(format!(
                        "line {}: non-numeric score '{}'",
                        line_no + 1,
                        field
                    ))
                })?;
                table.push(value);
            }

            let found = table.len() - before;
            if found != n {
                return Err(SeqsimError::Parse(format!(
                    "line {}: expected {} scores, found {}",
                    line_no + 1,
                    n,
                    found
                )));
            }
            rows += 1;
        }

        if rows != n {
            return Err(SeqsimError::Parse(format!(
                "expected {} rows, found {}",
                n, rows
            )));
        }

        Ok(Self {
            alphabet,
            index,
            table,
            default_score: DEFAULT_UNKNOWN_SCORE,
        })
    }
}

fn parse_symbol(token: &str) -> Result<u8> {
    match token.as_bytes() {
        [symbol] if symbol.is_ascii_graphic() => Ok(*symbol),
        _ => Err(SeqsimError::Parse(format!(
            "symbol '{}' is not a single printable character",
            token
        ))),
    }
}
