// File system operations for the sample library and exported files
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to get app data directory")]
    NoAppDataDir,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Get the app data directory for Alchemist
pub fn get_app_data_dir() -> StorageResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(StorageError::NoAppDataDir)?;
    let app_dir = data_dir.join("com.alchemist.app");
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Default location of the sample library document
pub fn default_library_path() -> StorageResult<PathBuf> {
    Ok(get_app_data_dir()?.join("library.json"))
}

/// Write a file into `dir` (created if missing) and return its path and
/// SHA256 hash
pub fn write_file(dir: &Path, filename: &str, data: &[u8]) -> StorageResult<(PathBuf, String)> {
    fs::create_dir_all(dir)?;

    let file_path = dir.join(filename);
    let mut file = fs::File::create(&file_path)?;
    file.write_all(data)?;

    Ok((file_path, calculate_sha256(data)))
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_calculate_sha256() {
        let data = b"hello world";
        let hash = calculate_sha256(data);
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_write_file_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested").join("exports");

        let (path, hash) = write_file(&target, "kick_1.wav", b"RIFF").unwrap();
        assert!(path.exists());
        assert_eq!(fs::read(&path).unwrap(), b"RIFF");
        assert_eq!(hash, calculate_sha256(b"RIFF"));
    }
}
