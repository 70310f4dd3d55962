//! Plain-text rendering of history entries

use crate::history::{Cleanup, Entry};

const SUMMARY_WIDTH: usize = 60;

/// One listing line: position, capture time, kind and a short summary
pub fn format_entry(position: usize, entry: &Entry) -> String {
    format!(
        "{}. [{}] {:<10} {}",
        position,
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.kind().as_str(),
        entry.summary(SUMMARY_WIDTH)
    )
}

pub fn print_entries(entries: &[Entry]) {
    for (i, entry) in entries.iter().enumerate() {
        println!("{}", format_entry(i + 1, entry));
        println!("   id: {}", entry.id);
    }
}

pub fn print_cleanup_failures(cleanup: &Cleanup) {
    for failure in &cleanup.failures {
        eprintln!(
            "warning: could not remove {}: {}",
            failure.path.display(),
            failure.error
        );
    }
}
