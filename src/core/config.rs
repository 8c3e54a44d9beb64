//! Configuration for image-fetcher
//!
//! Holds the target directory, network limits and safety limits used by a run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default folder images are collected into
pub const DEFAULT_TARGET_DIR: &str = "Fetched_Images";

/// Default maximum accepted image size (10 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default whole-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Content types accepted as images
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
];

/// URL path extensions accepted as images (lowercase, without the dot)
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Settings for a fetch run
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory images are stored in
    pub target_dir: PathBuf,

    /// Upper bound on a whole request, body included
    pub timeout: Duration,

    /// Upper bound on establishing the connection
    pub connect_timeout: Duration,

    /// Largest accepted image, in bytes
    pub max_bytes: u64,

    /// Accepted media types (compared case-insensitively against the essence)
    pub allowed_types: Vec<String>,

    /// Accepted URL path extensions
    pub allowed_extensions: Vec<String>,

    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_agent: format!(
                "image-fetcher/{} (Community Image Collector)",
                env!("IMAGE_FETCHER_VERSION")
            ),
        }
    }
}

impl FetchConfig {
    /// Default configuration storing into `dir`
    pub fn with_target_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: dir.into(),
            ..Default::default()
        }
    }
}

/// Progress callback function type, called with (downloaded, total) bytes.
/// `total` is 0 when the server did not declare a length.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Per-call options
#[derive(Default, Clone)]
pub struct FetchOptions {
    /// Optional progress callback
    pub progress: Option<ProgressCallback>,
}
