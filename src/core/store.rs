//! Persistence of accepted images into the target directory

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use reqwest::Url;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::core::error::{Error, Result};
use crate::core::hash_index::ContentHash;
use crate::core::safety::media_type_essence;

/// Stem used when the URL does not provide a usable filename
pub const FALLBACK_STEM: &str = "downloaded_image";

/// Room left for a collision suffix under NAME_MAX
const MAX_NAME_BYTES: usize = 200;

/// Gives up after this many taken names
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// A file written by the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    pub path: PathBuf,
    pub file_name: String,
    pub hash: ContentHash,
    pub size: u64,
}

/// Writes images into a single directory, never replacing existing files
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open the store, creating the directory if it is missing.
    ///
    /// Failing here means nothing can be stored at all, so callers treat it
    /// as fatal for the run.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::filesystem(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` under `file_name`, or under `stem_N.ext` when taken
    pub async fn save(
        &self,
        file_name: &str,
        content: &[u8],
        hash: ContentHash,
    ) -> Result<StoredFile> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::filesystem(&self.dir, e))?;

        let (stem, ext) = split_name(file_name);

        for counter in 0..=MAX_COLLISION_SUFFIX {
            let candidate = if counter == 0 {
                file_name.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{stem}_{counter}.{ext}"),
                    None => format!("{stem}_{counter}"),
                }
            };
            let path = self.dir.join(&candidate);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("{} is taken, trying next suffix", path.display());
                    continue;
                }
                Err(e) => return Err(Error::filesystem(path, e)),
            };

            if let Err(e) = write_all(&mut file, content).await {
                drop(file);
                discard_partial(&path).await;
                return Err(Error::filesystem(path, e));
            }

            info!("Stored {} ({} bytes)", path.display(), content.len());
            return Ok(StoredFile {
                path,
                file_name: candidate,
                hash,
                size: content.len() as u64,
            });
        }

        Err(Error::filesystem(
            self.dir.join(file_name),
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "no free filename left for this name",
            ),
        ))
    }
}

async fn write_all(file: &mut tokio::fs::File, content: &[u8]) -> std::io::Result<()> {
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Remove a file left behind by a failed write. Returns whether it is gone.
async fn discard_partial(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not remove partial file {}: {e}", path.display());
            false
        }
    }
}

/// Split "name.ext" into ("name", Some("ext"))
fn split_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    }
}

/// Filename for an image fetched from `url`.
///
/// Uses the last path segment when it looks like a filename (contains a
/// dot), otherwise `downloaded_image.<ext>` with the extension taken from the
/// content type.
pub fn derive_filename(url: &Url, content_type: Option<&str>) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let candidate = sanitize_filename(segment);

    if candidate.contains('.') && !candidate.starts_with('.') {
        candidate
    } else {
        format!("{FALLBACK_STEM}.{}", extension_for(content_type))
    }
}

/// File extension for a content type, defaulting to jpg
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let essence = content_type.map(media_type_essence).unwrap_or_default();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        _ => "jpg",
    }
}

/// Make a URL segment safe to use as a filename.
///
/// Separators, NUL and control characters become `_`, runs of `_` collapse,
/// leading/trailing dots, spaces and underscores are trimmed and the result
/// is capped in length.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let c = if c == '/' || c == '\\' || c == '\0' || c.is_control() || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_' || c == ' ');
    if trimmed.len() <= MAX_NAME_BYTES {
        return trimmed.to_string();
    }

    // Keep the extension when cutting
    let (stem, ext) = split_name(trimmed);
    let ext_len = ext.map(|e| e.len() + 1).unwrap_or(0);
    let mut take = MAX_NAME_BYTES.saturating_sub(ext_len);
    while take > 0 && !stem.is_char_boundary(take) {
        take -= 1;
    }
    match ext {
        Some(ext) if ext_len < MAX_NAME_BYTES => format!("{}.{ext}", &stem[..take]),
        _ => {
            let mut take = MAX_NAME_BYTES;
            while take > 0 && !trimmed.is_char_boundary(take) {
                take -= 1;
            }
            trimmed[..take].to_string()
        }
    }
}
