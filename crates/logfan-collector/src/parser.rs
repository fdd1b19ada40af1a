use chrono::{DateTime, Utc};

/// Split a source-provided RFC 3339 timestamp prefix off a raw line.
///
/// `kubectl logs --timestamps=true` prefixes every line with a timestamp
/// such as `2024-01-15T10:30:00.123456789Z`. When one parses, it is
/// returned alongside the rest of the line; otherwise the whole line passes
/// through untouched. The collector's own capture timestamp is unaffected
/// either way.
pub fn split_source_timestamp(raw: &str) -> (Option<DateTime<Utc>>, &str) {
    // Shortest accepted form is 2024-01-15T10:30:00Z (20 chars); the
    // nanosecond form ends within the first ~35.
    if raw.len() >= 20 {
        let search_end = floor_char_boundary(raw, 35.min(raw.len()));
        if let Some(z_pos) = raw.get(..search_end).and_then(|s| s.find('Z')) {
            let candidate = &raw[..=z_pos];
            if let Ok(ts) = DateTime::parse_from_rfc3339(candidate) {
                let rest = raw[z_pos + 1..].strip_prefix(' ').unwrap_or(&raw[z_pos + 1..]);
                return (Some(ts.with_timezone(&Utc)), rest);
            }
        }
    }
    (None, raw)
}

/// Largest valid char boundary at or below `idx`.
fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
