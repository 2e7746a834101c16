use chrono::DateTime;

/// UTC timestamp for status lines and data-range displays.
pub fn fmt_utc_ms(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// HH:MM:SS rendering of a millisecond span; hours are not wrapped.
pub fn fmt_hms(ms: f64) -> String {
    let total_s = (ms / 1000.0).floor().max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total_s / 3600,
        (total_s / 60) % 60,
        total_s % 60
    )
}
