//! Human-readable capture summaries

use crate::state::ProgressSnapshot;

/// Formats a byte count with a binary unit suffix
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Prints the final counters of a task to stdout
///
/// # Arguments
///
/// * `progress` - The final snapshot of the task
/// * `archive_bytes` - Size of the written archive, if one was produced
pub fn print_summary(progress: &ProgressSnapshot, archive_bytes: Option<usize>) {
    println!("=== Capture Summary ===\n");

    println!("Pages:");
    println!("  Captured: {}", progress.pages_crawled);
    println!();

    println!("Assets:");
    println!("  Discovered: {}", progress.total);
    println!("  Downloaded: {}", progress.downloaded);
    println!("  Failed: {}", progress.failed);
    println!("  Skipped: {}", progress.skipped);
    println!("  Bytes: {}", format_bytes(progress.bytes_downloaded));
    println!();

    if let Some(size) = archive_bytes {
        println!("Archive size: {}", format_bytes(size as u64));
    }

    let success_rate = if progress.total > 0 {
        (progress.downloaded as f64 / progress.total as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Elapsed: {:.1}s, {:.1}% of assets downloaded",
        progress.elapsed_ms as f64 / 1000.0,
        success_rate
    );
}
