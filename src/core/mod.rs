//! Core library modules for image-fetcher
//!
//! This module contains the internal implementation details of the image-fetcher library.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod hash_index;
pub mod orchestrator;
pub mod safety;
pub mod store;

// Re-export main types for internal use
pub use config::{FetchConfig, FetchOptions, ProgressCallback};
pub use orchestrator::{BatchReport, ImageFetcher, Outcome, UrlReport};
