//! Byte count formatting.

const UNITS: [&str; 9] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi", "Yi"];

/// Format a byte count with binary prefixes and one decimal (e.g. "1.5KiB").
pub fn to_human(bytes: u64) -> String {
    scale(bytes as f64)
}

fn scale(mut value: f64) -> String {
    let (last, rest) = UNITS.split_last().unwrap_or((&"", &[]));
    for unit in rest {
        if value.abs() < 1024.0 {
            return format!("{:.1}{}B", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}{}B", value, last)
}
