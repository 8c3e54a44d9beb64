//! Per-URL pipeline: fetch, validate, dedupe, store
//!
//! Each URL runs to a terminal [`Outcome`] before the next one starts. Errors
//! never escape a single URL; only opening the target directory can fail a
//! whole run.

use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;

use crate::core::config::{FetchConfig, FetchOptions};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::fetcher::Fetcher;
use crate::core::hash_index::{ContentHash, HashIndex};
use crate::core::safety::SafetyPolicy;
use crate::core::store::{derive_filename, Store, StoredFile};

/// Terminal state of one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Written to disk
    Stored { file: StoredFile },
    /// Same content already present
    Duplicate { hash: ContentHash, existing: PathBuf },
    /// Rejected by the safety validator
    Unsafe { reason: String },
    /// Bad URL, connection failure, timeout or non-2xx status
    NetworkFailed { reason: String },
    /// Could not write the file
    FilesystemFailed { reason: String },
}

impl Outcome {
    fn from_error(err: Error) -> Self {
        match err {
            Error::Duplicate { hash, existing } => Outcome::Duplicate { hash, existing },
            Error::UnsafeContent(violation) => Outcome::Unsafe {
                reason: violation.to_string(),
            },
            other => match other.kind() {
                ErrorKind::Filesystem => Outcome::FilesystemFailed {
                    reason: other.to_string(),
                },
                _ => Outcome::NetworkFailed {
                    reason: other.to_string(),
                },
            },
        }
    }

    /// Stored or already present
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Stored { .. } | Outcome::Duplicate { .. })
    }
}

/// Outcome for one requested URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlReport {
    pub url: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Outcomes of a batch, in request order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<UrlReport>,
}

impl BatchReport {
    pub fn push(&mut self, url: impl Into<String>, outcome: Outcome) {
        self.results.push(UrlReport {
            url: url.into(),
            outcome,
        });
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Stored { .. }))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Duplicate { .. }))
    }

    pub fn unsafe_skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unsafe { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                Outcome::NetworkFailed { .. } | Outcome::FilesystemFailed { .. }
            )
        })
    }

    /// Stored plus duplicates
    pub fn successful(&self) -> usize {
        self.count(Outcome::is_success)
    }
}

/// Runs the fetch pipeline against one target directory
pub struct ImageFetcher {
    fetcher: Fetcher,
    policy: SafetyPolicy,
    store: Store,
    index: HashIndex,
}

impl ImageFetcher {
    /// Open the target directory and index the files already in it
    pub async fn new(config: FetchConfig) -> Result<Self> {
        let store = Store::open(&config.target_dir).await?;
        let index = HashIndex::scan(store.dir()).await?;
        info!(
            "Collecting into {} ({} existing images)",
            store.dir().display(),
            index.len()
        );

        Ok(Self {
            fetcher: Fetcher::new(&config)?,
            policy: SafetyPolicy::from_config(&config),
            store,
            index,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run one URL to its terminal state
    pub async fn process(&mut self, url: &str, options: &FetchOptions) -> Outcome {
        match self.try_process(url, options).await {
            Ok(file) => Outcome::Stored { file },
            Err(err) => {
                match err.kind() {
                    ErrorKind::Duplicate => info!("{url}: {err}"),
                    _ => warn!("{url}: {err}"),
                }
                Outcome::from_error(err)
            }
        }
    }

    async fn try_process(&mut self, url: &str, options: &FetchOptions) -> Result<StoredFile> {
        let pending = self.fetcher.fetch(url).await?;
        self.policy.check(pending.meta())?;

        let fetched = pending
            .read_body(&self.policy, options.progress.as_ref())
            .await?;

        let hash = ContentHash::of(&fetched.content);
        if let Some(existing) = self.index.lookup(&hash) {
            return Err(Error::Duplicate {
                hash,
                existing: existing.to_path_buf(),
            });
        }

        let file_name = derive_filename(
            &fetched.meta.final_url,
            fetched.meta.content_type.as_deref(),
        );
        let stored = self.store.save(&file_name, &fetched.content, hash).await?;
        self.index.insert(stored.hash.clone(), stored.path.clone());
        Ok(stored)
    }

    /// Process URLs in order. Entries are trimmed and blank ones skipped.
    pub async fn process_batch<I, S>(&mut self, urls: I, options: &FetchOptions) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = BatchReport::default();
        for url in urls {
            let url = url.as_ref().trim();
            if url.is_empty() {
                continue;
            }
            let outcome = self.process(url, options).await;
            report.push(url, outcome);
        }
        report
    }
}
