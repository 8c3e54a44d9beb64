//! CLI-specific utilities for image-fetcher
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod progress;
pub mod prompt;
pub mod report;

pub use progress::ProgressManager;
