//! CLI-specific progress handling for image-fetcher
//!
//! One progress bar per download, fed by the library's progress callback.

use std::sync::Arc;

use image_fetcher::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {bytes_per_sec}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} {bytes_per_sec}";

/// Creates a progress bar for CLI display. A zero size starts as a spinner.
pub fn create_progress_bar(total_size: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_size);
    pb.set_style(style_for(total_size));
    pb
}

fn style_for(total_size: u64) -> ProgressStyle {
    let template = if total_size > 0 {
        BAR_TEMPLATE
    } else {
        SPINNER_TEMPLATE
    };
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Progress bar bound to a single download
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    pub fn new() -> Self {
        Self {
            pb: create_progress_bar(0),
        }
    }

    /// Callback that drives this bar; switches to a sized bar once the
    /// server declares a length
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Arc::new(move |downloaded, total| {
            if total > 0 && pb.length().unwrap_or(0) != total {
                pb.set_length(total);
                pb.set_style(style_for(total));
            }
            pb.set_position(downloaded);
        })
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}
