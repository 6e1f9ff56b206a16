//! Output formatting helpers.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use serde::Serialize;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a follow-up suggestion.
pub fn hint(msg: &str) {
    eprintln!("{} {}", "→".yellow(), msg);
}

/// Print a progress note to stderr.
pub fn note(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Local wall-clock time with a relative suffix, e.g. `14:05 (2h 10m ago)`.
pub fn when(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let local = at.with_timezone(&Local);
    format!("{} ({} ago)", local.format("%a %H:%M"), span((now - at).num_seconds()))
}

/// Compact rendering of a number of seconds: `45m`, `2h 10m`, `3d 4h`.
pub fn span(secs: i64) -> String {
    let secs = secs.max(0);
    let (days, hours, minutes) = (secs / 86_400, secs % 86_400 / 3_600, secs % 3_600 / 60);
    match (days, hours) {
        (0, 0) => format!("{}m", minutes),
        (0, _) => format!("{}h {}m", hours, minutes),
        _ => format!("{}d {}h", days, hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_picks_units() {
        assert_eq!(span(59), "0m");
        assert_eq!(span(45 * 60), "45m");
        assert_eq!(span(2 * 3600 + 10 * 60), "2h 10m");
        assert_eq!(span(3 * 86_400 + 4 * 3600 + 59), "3d 4h");
        assert_eq!(span(-5), "0m");
    }
}
