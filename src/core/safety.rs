//! Safety checks applied to a response before its body is accepted

use crate::core::config::FetchConfig;
use crate::core::error::Violation;
use crate::core::fetcher::ResponseMeta;

/// Allowed types, extensions and size limit for a run
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    allowed_types: Vec<String>,
    allowed_extensions: Vec<String>,
    max_bytes: u64,
}

impl SafetyPolicy {
    pub fn new(
        allowed_types: impl IntoIterator<Item = impl Into<String>>,
        allowed_extensions: impl IntoIterator<Item = impl Into<String>>,
        max_bytes: u64,
    ) -> Self {
        Self {
            allowed_types: allowed_types
                .into_iter()
                .map(|t| t.into().to_ascii_lowercase())
                .collect(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_bytes,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.allowed_types.iter().cloned(),
            config.allowed_extensions.iter().cloned(),
            config.max_bytes,
        )
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check declared response metadata.
    ///
    /// Size is checked first, then content type, then the extension of the
    /// final URL. Returns the first violated constraint.
    pub fn check(&self, meta: &ResponseMeta) -> Result<(), Violation> {
        if let Some(declared) = meta.content_length {
            self.check_size(declared)?;
        }

        let content_type = meta
            .content_type
            .as_deref()
            .map(media_type_essence)
            .filter(|essence| !essence.is_empty())
            .ok_or(Violation::MissingContentType)?;

        if !self.allowed_types.iter().any(|t| *t == content_type) {
            return Err(Violation::DisallowedType(content_type));
        }

        if let Some(ext) = url_extension(meta.final_url.path()) {
            if !self.allowed_extensions.contains(&ext) {
                return Err(Violation::DisallowedExtension(ext));
            }
        }

        Ok(())
    }

    /// Check an actual or declared byte count against the limit
    pub fn check_size(&self, size: u64) -> Result<(), Violation> {
        if size > self.max_bytes {
            return Err(Violation::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Lowercased media type without parameters: "Image/PNG; q=1" -> "image/png"
pub fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Lowercased extension of the last path segment, if it has one
fn url_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
