use crate::errors::{AppError, AppResult};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar with the standard application styling.
///
/// This helper centralizes the progress bar configuration so fetch progress
/// looks the same everywhere. With `quiet` set, a hidden bar is returned and
/// all progress calls become no-ops.
///
/// # Arguments
///
/// * `total` - Total number of items to process
/// * `quiet` - Suppress progress rendering entirely
///
/// # Returns
///
/// Returns a configured `ProgressBar` ready for use, or an error if template
/// creation fails.
pub fn create_progress_bar(total: u64, quiet: bool) -> AppResult<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
            )
            .map_err(|e| AppError::Io(format!("Failed to create progress bar template: {e}")))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
