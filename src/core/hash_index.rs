//! Content fingerprints and duplicate lookup
//!
//! A fingerprint is the SHA-256 of the full byte content, rendered as lowercase
//! hex. Comparison is exact-match only. The index is rebuilt from the target
//! directory at the start of every run and kept in memory for that run only.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::core::error::{Error, Result};

const BUF_SIZE: usize = 64 * 1024;

/// Deterministic fingerprint of a byte sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Fingerprint an in-memory buffer
    pub fn of(content: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(content)))
    }

    /// Fingerprint a file, reading it in chunks
    pub async fn of_file(path: &Path) -> std::io::Result<Self> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; BUF_SIZE];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprints of the files in one directory
#[derive(Debug, Default)]
pub struct HashIndex {
    entries: HashMap<ContentHash, PathBuf>,
}

impl HashIndex {
    /// Hash every regular file directly inside `dir`.
    ///
    /// A missing directory yields an empty index. Files that cannot be read
    /// are skipped with a warning.
    pub async fn scan(dir: &Path) -> Result<Self> {
        let mut index = Self::default();

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Hash scan: {} does not exist yet", dir.display());
                return Ok(index);
            }
            Err(e) => return Err(Error::filesystem(dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::filesystem(dir, e))?
        {
            let path = entry.path();
            // Follows symlinks
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {}
                _ => continue,
            }

            match ContentHash::of_file(&path).await {
                Ok(hash) => {
                    index.entries.entry(hash).or_insert(path);
                }
                Err(e) => warn!("Skipping unreadable file {}: {e}", path.display()),
            }
        }

        debug!(
            "Hash scan of {} found {} distinct files",
            dir.display(),
            index.len()
        );
        Ok(index)
    }

    /// Path of an existing file with this fingerprint
    pub fn lookup(&self, hash: &ContentHash) -> Option<&Path> {
        self.entries.get(hash).map(PathBuf::as_path)
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.entries.contains_key(hash)
    }

    /// Record a newly stored file
    pub fn insert(&mut self, hash: ContentHash, path: PathBuf) {
        self.entries.entry(hash).or_insert(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scan `dir` and report the file whose content matches `hash`, if any
pub async fn find_match(dir: &Path, hash: &ContentHash) -> Result<Option<PathBuf>> {
    let index = HashIndex::scan(dir).await?;
    Ok(index.lookup(hash).map(Path::to_path_buf))
}
