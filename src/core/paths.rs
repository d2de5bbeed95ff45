use std::path::PathBuf;
use std::sync::OnceLock;

// Cache the paths to avoid repeated environment lookups
static SEQSIM_HOME: OnceLock<PathBuf> = OnceLock::new();
static SEQSIM_CACHE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// File name used for the similarity matrix when cache keys are disabled
pub const UNKEYED_MATRIX_NAME: &str = "similarity_matrix.bin";

/// Get the seqsim home directory
/// Checks SEQSIM_HOME environment variable, falls back to ${HOME}/.seqsim
pub fn seqsim_home() -> PathBuf {
    SEQSIM_HOME
        .get_or_init(|| {
            if let Ok(path) = std::env::var("SEQSIM_HOME") {
                PathBuf::from(path)
            } else {
                let home = std::env::var("HOME").unwrap_or_else(|_| {
                    std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string())
                });
                PathBuf::from(home).join(".seqsim")
            }
        })
        .clone()
}

/// Get the cache directory holding persisted similarity matrices
/// Checks SEQSIM_CACHE_DIR environment variable, falls back to SEQSIM_HOME/cache
pub fn cache_dir() -> PathBuf {
    SEQSIM_CACHE_DIR
        .get_or_init(|| {
            if let Ok(path) = std::env::var("SEQSIM_CACHE_DIR") {
                PathBuf::from(path)
            } else {
                seqsim_home().join("cache")
            }
        })
        .clone()
}

/// File name for a matrix cached under a content key
pub fn keyed_matrix_name(key: &str) -> String {
    format!("similarity_{}.bin", key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dir_is_stable() {
        assert_eq!(cache_dir(), cache_dir());
    }

    #[test]
    fn test_keyed_matrix_name() {
        assert_eq!(keyed_matrix_name("ab12"), "similarity_ab12.bin");
    }
}
