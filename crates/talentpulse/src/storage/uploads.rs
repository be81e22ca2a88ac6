//! Upload store for submitted documents.
//!
//! Each batch gets its own subdirectory; each document is stored as
//! `{job_id}_{filename}` so two uploads with the same name never
//! collide.

use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::StorageError;
use crate::sanitize::safe_filename;

/// Stores uploaded document bytes under a batch-scoped directory.
pub struct UploadStore {
    upload_directory: PathBuf,
}

impl UploadStore {
    pub fn new<P: AsRef<Path>>(upload_directory: P) -> Self {
        Self {
            upload_directory: upload_directory.as_ref().to_path_buf(),
        }
    }

    pub fn upload_directory(&self) -> &Path {
        &self.upload_directory
    }

    /// Persists a document's bytes for a job.
    ///
    /// The client-supplied filename is sanitized before it touches the
    /// filesystem. Creation is exclusive (`O_CREAT | O_EXCL`); a second
    /// store under the same job id fails rather than clobbering.
    pub fn store(
        &self,
        batch_id: &str,
        job_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let dir = self.upload_directory.join(batch_id);
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| StorageError::CreateDirectory {
                path: dir.clone(),
                source: e,
            })?;
        }

        let path = dir.join(format!("{}_{}", job_id, safe_filename(filename)));

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    StorageError::FileExists(path.clone())
                } else {
                    StorageError::WriteFile {
                        path: path.clone(),
                        source: e,
                    }
                }
            })?;
        file.write_all(content).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }
}

/// Hex-encoded SHA-256 digest of a document's content.
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
