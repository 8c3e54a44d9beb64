//! Console reporting of per-URL outcomes and batch summaries

use image_fetcher::{BatchReport, Outcome};

/// One human-readable line for an outcome
pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Stored { file } => {
            format!("✅ Saved {} ({} bytes)", file.path.display(), file.size)
        }
        Outcome::Duplicate { existing, .. } => format!(
            "✅ Already in collection as {} (duplicate prevented)",
            existing.display()
        ),
        Outcome::Unsafe { reason } => format!("⚠️  Skipped unsafe content: {reason}"),
        Outcome::NetworkFailed { reason } => format!("❌ Connection error: {reason}"),
        Outcome::FilesystemFailed { reason } => format!("❌ Could not save: {reason}"),
    }
}

pub fn print_outcome(outcome: &Outcome) {
    eprintln!("{}", format_outcome(outcome));
}

pub fn format_summary(report: &BatchReport) -> String {
    format!(
        "Successfully downloaded {}/{} images ({} new, {} duplicates, {} unsafe, {} failed)",
        report.successful(),
        report.len(),
        report.stored(),
        report.duplicates(),
        report.unsafe_skipped(),
        report.failed()
    )
}

pub fn print_summary(report: &BatchReport) {
    eprintln!();
    eprintln!("📊 {}", format_summary(report));
}

/// Machine-readable report on stdout
pub fn print_json(report: &BatchReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
