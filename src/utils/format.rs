//! Human-readable duration formatting.

/// Format a duration in seconds using the largest fitting unit.
///
/// ```
/// use snippet_compare::utils::format_duration;
/// assert_eq!(format_duration(0.0025), "2.50ms");
/// assert_eq!(format_duration(125.0), "2m 5.00s");
/// ```
pub fn format_duration(seconds: f64) -> String {
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor();
        let rest = seconds - minutes * 60.0;
        format!("{}m {:.2}s", minutes as u64, rest)
    } else if seconds >= 1.0 {
        format!("{:.2}s", seconds)
    } else if seconds >= 1e-3 {
        format!("{:.2}ms", seconds * 1e3)
    } else if seconds >= 1e-6 {
        format!("{:.2}μs", seconds * 1e6)
    } else {
        format!("{:.2}ns", seconds * 1e9)
    }
}
