//! Human-readable strings shown next to the file list and in notifications.

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB"];
const MAX_LISTED_NAMES: usize = 3;

/// Formats a byte count with binary units: `512 B`, `1.5 KB`, `50.0 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", SIZE_UNITS[unit])
}

/// Lists at most three names, appending `+N more` for the remainder.
pub fn summarize_names(names: &[String]) -> String {
    let shown = names
        .iter()
        .take(MAX_LISTED_NAMES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    match names.len().checked_sub(MAX_LISTED_NAMES) {
        Some(rest) if rest > 0 => format!("{shown} +{rest} more"),
        _ => shown,
    }
}

/// `""` for one item, `"s"` otherwise.
pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
