//! Time formatting helpers.

use std::time::Duration;

/// Format an elapsed time for humans: `"850µs"`, `"12.4ms"`, `"3.21s"`, `"2m 5s"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let micros = elapsed.as_micros();
    if micros < 1_000 {
        format!("{micros}µs")
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1_000.0)
    } else if elapsed.as_secs() < 60 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        let secs = elapsed.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Events per second over `elapsed`, formatted to one decimal.
pub fn format_rate(count: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return "n/a".to_string();
    }
    format!("{:.1}/s", count as f64 / secs)
}
