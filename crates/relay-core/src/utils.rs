use chrono::Utc;

/// RFC3339 timestamp in UTC (row stamps, logs).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

/// Cut `s` to at most `max_chars` characters, appending `...` when something was dropped.
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out = s.chars().take(max_chars).collect::<String>();
    out.push_str("...");
    out
}
