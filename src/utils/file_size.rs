const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte count, binary multiples.
pub fn format_size(size: u64) -> String {
    let mut value = size as f64;
    let mut unit_index = 0;

    while value >= 1024.0 && unit_index < UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit_index])
    }
}

/// `2024-03-01T10:15:42.000Z` -> `2024-03-01 10:15`. Anything that does not
/// look like an ISO timestamp is shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    match raw.split_once('T').and_then(|(date, time)| Some((date, time.get(..5)?))) {
        Some((date, hours_minutes)) => format!("{date} {hours_minutes}"),
        None => raw.to_string(),
    }
}
