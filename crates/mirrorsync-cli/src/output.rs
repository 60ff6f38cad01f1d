//! Run summary output

use mirrorsync_sync::SyncReport;

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Formats a byte count for human-readable output.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Prints the run summary to stdout.
pub fn print_report(report: &SyncReport, format: OutputFormat) {
    match format {
        OutputFormat::Human => print_human(report),
        OutputFormat::Json => print_json(report),
    }
}

fn print_human(report: &SyncReport) {
    let secs = report.duration.as_secs_f64();
    println!("Session {}", report.session_id);
    println!(
        "  considered: {}, uploaded: {}, skipped: {}, mismatches: {}",
        report.files_considered, report.files_uploaded, report.files_skipped, report.mismatches
    );
    println!(
        "  transferred {} in {:.1}s ({}/s)",
        format_bytes(report.bytes_uploaded),
        secs,
        format_bytes(if secs > 0.0 {
            (report.bytes_uploaded as f64 / secs) as u64
        } else {
            0
        })
    );
    if report.destination_bytes != report.bytes_uploaded {
        println!(
            "  destination grew by {}",
            format_bytes(report.destination_bytes)
        );
    }
    if report.budget_exhausted {
        println!("  halted: transfer budget exhausted");
    }
    for failure in &report.failures {
        println!("  FAILED {}: {}", failure.path, failure.message);
    }
}

fn print_json(report: &SyncReport) {
    let value = serde_json::json!({
        "session_id": report.session_id.to_string(),
        "files_considered": report.files_considered,
        "files_uploaded": report.files_uploaded,
        "files_skipped": report.files_skipped,
        "mismatches": report.mismatches,
        "bytes_uploaded": report.bytes_uploaded,
        "destination_bytes": report.destination_bytes,
        "budget_exhausted": report.budget_exhausted,
        "duration_ms": report.duration.as_millis() as u64,
        "failures": report
            .failures
            .iter()
            .map(|f| serde_json::json!({ "path": f.path, "message": f.message }))
            .collect::<Vec<_>>(),
    });
    println!("{value}");
}
