use crate::bio::alignment::GAP;
use crate::{Result, SeqsimError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    /// Position within the input collection
    pub index: usize,
    pub id: String,
    pub residues: Vec<u8>,
}

impl Sequence {
    pub fn new(index: usize, residues: Vec<u8>) -> Self {
        Self {
            index,
            id: format!("Seq {}", index),
            residues,
        }
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.residues
    }
}

impl AsRef<[u8]> for Sequence {
    fn as_ref(&self) -> &[u8] {
        &self.residues
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.residues))
    }
}

/// Read sequences from a file, one per line or in FASTA format
pub fn load_sequences<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SeqsimError::NotFound(format!("sequence file {}", path.display()))
        } else {
            SeqsimError::Io(e)
        }
    })?;

    let sequences = parse_sequences(&data)
        .map_err(|e| match e {
            SeqsimError::Parse(msg) => SeqsimError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

    debug!("Loaded {} sequences from {}", sequences.len(), path.display());
    Ok(sequences)
}

/// Parse sequences from raw bytes.
///
/// Input whose first non-blank line starts with `>` is read as FASTA, anything
/// else as one sequence per line. Blank lines are skipped and indices are
/// assigned in order of the sequences that remain.
pub fn parse_sequences(data: &[u8]) -> Result<Vec<Sequence>> {
    let is_fasta = data
        .split(|&b| b == b'\n')
        .map(|line| line.trim_ascii())
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with(b">"));

    if is_fasta {
        parse_fasta(data)
    } else {
        parse_lines(data)
    }
}

fn parse_lines(data: &[u8]) -> Result<Vec<Sequence>> {
    let mut sequences = Vec::new();
    let mut skipped = 0;

    for (line_no, line) in data.split(|&b| b == b'\n').enumerate() {
        let line = line.trim_ascii();
        if line.is_empty() {
            skipped += 1;
            continue;
        }
        validate_residues(line, line_no)?;
        sequences.push(Sequence::new(sequences.len(), line.to_vec()));
    }

    // A trailing newline yields one empty fragment that is not a real blank line
    if data.ends_with(b"\n") {
        skipped -= 1;
    }
    if skipped > 0 {
        warn!("Skipped {} blank lines in sequence input", skipped);
    }

    Ok(sequences)
}

fn parse_fasta(data: &[u8]) -> Result<Vec<Sequence>> {
    let mut sequences: Vec<Sequence> = Vec::new();

    for (line_no, line) in data.split(|&b| b == b'\n').enumerate() {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix(b">") {
            let header = String::from_utf8_lossy(header);
            let id = header.split_whitespace().next().unwrap_or_default().to_string();
            let index = sequences.len();
            let sequence = Sequence::new(index, Vec::new());
            sequences.push(if id.is_empty() { sequence } else { sequence.with_id(id) });
            continue;
        }

        validate_residues(line, line_no)?;
        match sequences.last_mut() {
            Some(current) => current.residues.extend_from_slice(line),
            None => {
                return Err(SeqsimError::Parse(format!(
                    "line {}: sequence data before first header",
                    line_no + 1
                )))
            }
        }
    }

    let empty = sequences.iter().filter(|s| s.is_empty()).count();
    if empty > 0 {
        warn!("{} FASTA records have no residues", empty);
    }

    Ok(sequences)
}

fn validate_residues(line: &[u8], line_no: usize) -> Result<()> {
    match line.iter().position(|&b| !b.is_ascii_graphic() || b == GAP) {
        Some(col) => Err(SeqsimError::Parse(format!(
            "line {}, column {}: invalid residue {:?}",
            line_no + 1,
            col + 1,
            line[col] as char
        ))),
        None => Ok(()),
    }
}
