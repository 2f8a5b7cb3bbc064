//! Lifetime formatting for CLI output.

/// Describe how long a credential has left, e.g. `"14m 05s left"`.
///
/// Zero reads as `"expired"`. Only the two most significant units are shown.
pub fn format_remaining(secs: u64) -> String {
    let (days, hours, mins, rem) = (secs / 86_400, secs / 3600 % 24, secs / 60 % 60, secs % 60);
    match (days, hours, mins) {
        _ if secs == 0 => "expired".to_string(),
        (0, 0, 0) => format!("{rem}s left"),
        (0, 0, m) => format!("{m}m {rem:02}s left"),
        (0, h, m) => format!("{h}h {m:02}m left"),
        (d, h, _) => format!("{d}d {h}h left"),
    }
}
