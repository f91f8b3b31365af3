//! Formatted output helpers for CLI commands.

use std::collections::BTreeMap;

use podrunner_common::status::StatusEntry;

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const CYAN: &str = "\x1b[36m";
pub const YELLOW: &str = "\x1b[33m";
pub const RESET: &str = "\x1b[0m";

/// Formats a byte count into a human-readable string (e.g., "128.0 MiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Formats declared ports as `8080 (web-svc), 9090 (metrics)`.
#[must_use]
pub fn format_services(ports: &BTreeMap<u16, String>) -> String {
    ports
        .iter()
        .map(|(port, service)| format!("{port} ({service})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats one history row of `podctl status`.
#[must_use]
pub fn format_entry(entry: &StatusEntry) -> String {
    format!(
        "{:<22} {:<10} {:<28} {}",
        entry.reported_at.format("%Y-%m-%d %H:%M:%S"),
        entry.report.status.to_string(),
        entry.report.reason,
        entry.report.message
    )
    .trim_end()
    .to_string()
}
