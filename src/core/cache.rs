//! Persistence for computed similarity matrices

use crate::core::similarity::SimilarityMatrix;
use crate::{Result, SeqsimError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const MATRIX_MAGIC: [u8; 4] = *b"SQSM";
const MATRIX_FORMAT_VERSION: u32 = 1;

/// Lookup capability the builder consults before computing anything
pub trait MatrixCache: Send + Sync {
    fn exists(&self, key: &str) -> bool;

    fn load(&self, key: &str) -> Result<SimilarityMatrix>;

    fn store(&self, key: &str, matrix: &SimilarityMatrix) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct MatrixFile {
    magic: [u8; 4],
    version: u32,
    size: usize,
    values: Vec<f64>,
}

/// Keys are file names (or paths) resolved against a root directory
#[derive(Debug, Clone)]
pub struct FileMatrixCache {
    root: PathBuf,
}

impl FileMatrixCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl MatrixCache for FileMatrixCache {
    fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    fn load(&self, key: &str) -> Result<SimilarityMatrix> {
        load_matrix(self.path_for(key))
    }

    fn store(&self, key: &str, matrix: &SimilarityMatrix) -> Result<()> {
        save_matrix(self.path_for(key), matrix)
    }
}

/// Process-local cache, mostly useful in tests
#[derive(Debug, Default)]
pub struct MemoryMatrixCache {
    entries: RwLock<HashMap<String, SimilarityMatrix>>,
}

impl MemoryMatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl MatrixCache for MemoryMatrixCache {
    fn exists(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn load(&self, key: &str) -> Result<SimilarityMatrix> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| SeqsimError::NotFound(format!("cached matrix {}", key)))
    }

    fn store(&self, key: &str, matrix: &SimilarityMatrix) -> Result<()> {
        self.entries.write().insert(key.to_string(), matrix.clone());
        Ok(())
    }
}

/// Write a matrix in the binary cache format, creating parent directories.
///
/// The data goes to a temporary sibling first and is renamed into place, so
/// readers never see a partially written file.
pub fn save_matrix<P: AsRef<Path>>(path: P, matrix: &SimilarityMatrix) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let envelope = MatrixFile {
        magic: MATRIX_MAGIC,
        version: MATRIX_FORMAT_VERSION,
        size: matrix.size(),
        values: matrix.values().to_vec(),
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut writer = BufWriter::new(std::fs::File::create(&tmp)?);
        bincode::serialize_into(&mut writer, &envelope)?;
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)?;

    debug!("Wrote {}x{} matrix to {}", matrix.size(), matrix.size(), path.display());
    Ok(())
}

pub fn load_matrix<P: AsRef<Path>>(path: P) -> Result<SimilarityMatrix> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SeqsimError::NotFound(format!("similarity matrix {}", path.display()))
        } else {
            SeqsimError::Io(e)
        }
    })?;

    let envelope: MatrixFile = bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
        SeqsimError::Parse(format!("{}: unreadable matrix file: {}", path.display(), e))
    })?;

    if envelope.magic != MATRIX_MAGIC {
        return Err(SeqsimError::Parse(format!(
            "{}: not a similarity matrix file",
            path.display()
        )));
    }
    if envelope.version != MATRIX_FORMAT_VERSION {
        return Err(SeqsimError::Parse(format!(
            "{}: unsupported matrix format version {}",
            path.display(),
            envelope.version
        )));
    }

    SimilarityMatrix::from_raw(envelope.size, envelope.values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SimilarityMatrix {
        SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.25, 1.5],
            vec![0.25, 1.0, 0.0],
            vec![1.5, 0.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_file_cache_creates_directories() {
        let dir = TempDir::new().unwrap();
        let cache = FileMatrixCache::new(dir.path().join("results").join("nested"));

        assert!(!cache.exists("m.bin"));
        cache.store("m.bin", &sample()).unwrap();
        assert!(cache.exists("m.bin"));
        assert_eq!(cache.load("m.bin").unwrap(), sample());
        assert!(!cache.path_for("m.bin.tmp").exists());
    }

    #[test]
    fn test_garbage_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.bin");
        std::fs::write(&path, b"definitely not a matrix").unwrap();

        assert!(matches!(load_matrix(&path), Err(SeqsimError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_matrix(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, SeqsimError::NotFound(_)));
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryMatrixCache::new();
        assert!(cache.is_empty());
        assert!(matches!(cache.load("x"), Err(SeqsimError::NotFound(_))));

        cache.store("x", &sample()).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.load("x").unwrap().get(0, 2), 1.5);
    }
}
