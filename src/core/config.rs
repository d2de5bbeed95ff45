use crate::bio::alignment::{DEFAULT_GAP_PENALTY, DEFAULT_UNKNOWN_SCORE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub alignment: AlignmentConfig,
    pub performance: PerformanceConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Added per gap column; negative values penalize gaps
    pub gap_penalty: f32,
    /// Substitution matrix file (None = bundled BLOSUM62)
    pub matrix: Option<PathBuf>,
    /// Score for symbol pairs outside the matrix alphabet
    pub default_score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Upper bound on worker threads; the pool never exceeds available cores
    pub max_workers: usize,
    /// Pairs handed to a worker at a time
    pub chunk_size: usize,
    /// Largest DP matrix (in cells) a single pair may allocate
    pub max_cells: usize,
    pub show_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for persisted matrices (None = SEQSIM_CACHE_DIR)
    pub dir: Option<PathBuf>,
    /// Name cached matrices after a hash of their inputs
    pub keyed: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            gap_penalty: DEFAULT_GAP_PENALTY,
            matrix: None,
            default_score: DEFAULT_UNKNOWN_SCORE,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            chunk_size: 10,
            max_cells: 400_000_000,
            show_progress: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            keyed: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), crate::SeqsimError> {
        if !self.alignment.gap_penalty.is_finite() {
            return Err(crate::SeqsimError::Config(
                "alignment.gap_penalty must be a finite number".to_string(),
            ));
        }
        if self.performance.max_workers == 0 {
            return Err(crate::SeqsimError::Config(
                "performance.max_workers must be at least 1".to_string(),
            ));
        }
        if self.performance.chunk_size == 0 {
            return Err(crate::SeqsimError::Config(
                "performance.chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(crate::core::paths::cache_dir)
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::SeqsimError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::SeqsimError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::SeqsimError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::SeqsimError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_values() {
        let config = default_config();
        assert_eq!(config.alignment.gap_penalty, -12.0);
        assert_eq!(config.alignment.default_score, -4);
        assert_eq!(config.performance.max_workers, 10);
        assert_eq!(config.performance.chunk_size, 10);
        assert!(config.cache.keyed);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[alignment]\ngap_penalty = -8.0\n").unwrap();
        assert_eq!(config.alignment.gap_penalty, -8.0);
        assert_eq!(config.performance.max_workers, 10);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seqsim.toml");

        let mut config = Config::default();
        config.performance.max_workers = 4;
        config.cache.keyed = false;
        save_config(&path, &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[performance]\nchunk_size = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, crate::SeqsimError::Config(_)));
    }
}
