//! # Image-fetcher Library
//!
//! Collects images from the web into a local folder. Every URL goes through
//! the same pipeline:
//!
//! 1. **Fetch** - one HTTP GET with a bounded timeout, no retries
//! 2. **Validate** - content type must be an allowed image type and the size
//!    must stay under the limit, otherwise nothing is written
//! 3. **Dedupe** - the SHA-256 of the content is compared against every file
//!    already in the folder
//! 4. **Store** - written under a name taken from the URL, never overwriting
//!    an existing file
//!
//! URLs are processed one after another. A failure on one URL never stops a
//! batch; each URL ends up with its own [`Outcome`].
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Single image into ./Fetched_Images
//!     let outcome = image_fetcher::fetch_one("https://example.com/cat.png", None).await?;
//!     println!("{outcome:?}");
//!
//!     // A batch into a custom folder
//!     let report = image_fetcher::fetch_all(
//!         ["https://example.com/a.png", "https://example.com/b.jpg"],
//!         Some("./pictures"),
//!     )
//!     .await?;
//!     println!("{}/{} fetched", report.successful(), report.len());
//!
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

pub use crate::core::config::{DEFAULT_MAX_BYTES, DEFAULT_TARGET_DIR};
pub use crate::core::{
    BatchReport, FetchConfig, FetchOptions, ImageFetcher, Outcome, ProgressCallback, UrlReport,
};
pub use crate::core::error::{Error, ErrorKind, Result, Violation};
pub use crate::core::fetcher::{FetchResult, Fetcher, ResponseMeta};
pub use crate::core::hash_index::{ContentHash, HashIndex};
pub use crate::core::safety::SafetyPolicy;
pub use crate::core::store::{Store, StoredFile};

// Internal modules
mod core;

fn config_for(dir: Option<&str>) -> FetchConfig {
    match dir {
        Some(dir) => FetchConfig::with_target_dir(dir),
        None => FetchConfig::default(),
    }
}

/// Fetch a single image
///
/// # Arguments
/// * `url` - Image URL
/// * `dir` - Optional target directory. Defaults to `Fetched_Images`
///
/// # Errors
/// Only when the target directory cannot be created or read. Per-URL
/// failures are reported through the returned [`Outcome`].
pub async fn fetch_one(url: &str, dir: Option<&str>) -> Result<Outcome> {
    let mut fetcher = ImageFetcher::new(config_for(dir)).await?;
    Ok(fetcher.process(url, &FetchOptions::default()).await)
}

/// Fetch a batch of images in order
///
/// Blank entries are skipped. Duplicates inside the batch are detected as
/// well as duplicates of files already in the directory.
pub async fn fetch_all<I, S>(urls: I, dir: Option<&str>) -> Result<BatchReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fetcher = ImageFetcher::new(config_for(dir)).await?;
    Ok(fetcher.process_batch(urls, &FetchOptions::default()).await)
}

/// Fetch a batch with full control over configuration and options
///
/// # Examples
/// ```rust,no_run
/// use image_fetcher::{FetchConfig, FetchOptions};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FetchConfig {
///     max_bytes: 2 * 1024 * 1024,
///     timeout: Duration::from_secs(5),
///     ..FetchConfig::with_target_dir("./thumbs")
/// };
/// let options = FetchOptions {
///     progress: Some(Arc::new(|downloaded, total| {
///         println!("Downloaded: {} / {}", downloaded, total);
///     })),
/// };
///
/// image_fetcher::fetch_with_options(["https://example.com/a.png"], config, options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn fetch_with_options<I, S>(
    urls: I,
    config: FetchConfig,
    options: FetchOptions,
) -> Result<BatchReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fetcher = ImageFetcher::new(config).await?;
    Ok(fetcher.process_batch(urls, &options).await)
}

/// Look for a file in `dir` whose content is byte-identical to `content`
pub async fn find_duplicate(dir: impl AsRef<Path>, content: &[u8]) -> Result<Option<PathBuf>> {
    let hash = ContentHash::of(content);
    crate::core::hash_index::find_match(dir.as_ref(), &hash).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_for() {
        assert_eq!(
            config_for(None).target_dir,
            PathBuf::from(DEFAULT_TARGET_DIR)
        );
        assert_eq!(
            config_for(Some("/tmp/pics")).target_dir,
            PathBuf::from("/tmp/pics")
        );
    }

    #[tokio::test]
    async fn test_find_duplicate() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("sun.jpg"), b"sunny").unwrap();

        assert_eq!(
            find_duplicate(dir.path(), b"sunny").await.unwrap(),
            Some(dir.path().join("sun.jpg"))
        );
        assert_eq!(find_duplicate(dir.path(), b"rainy").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_all_with_only_blank_urls() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out");
        let report = fetch_all(["", "  "], target.to_str()).await.unwrap();

        assert!(report.is_empty());
        assert!(target.is_dir(), "target directory should be bootstrapped");
    }
}
