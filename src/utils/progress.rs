//! Terminal progress indicators for long-running commands.

use crate::constants::SPINNER_CHARS;
use crate::library::IngestProgress;
use indicatif::{ProgressBar, ProgressStyle};

/// A cyan spinner showing `message`, used while the amount of work is unknown.
pub fn scan_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("spinner template is valid")
            .tick_strings(SPINNER_CHARS),
    );
    spinner.set_message(message.to_string());
    spinner
}

/// A bar sized for `total` files that shows the file being imported.
pub fn ingest_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
            .expect("progress template is valid")
            .progress_chars("█▓░"),
    );
    pb
}

/// A progress callback for `Library::ingest` and `Library::restore` that
/// drives `pb`.
pub fn report_to(pb: &ProgressBar) -> impl FnMut(IngestProgress) + '_ {
    move |progress| {
        pb.set_length(progress.total as u64);
        pb.set_position(progress.processed as u64);
        pb.set_message(progress.current_name);
    }
}
