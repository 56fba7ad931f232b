//! Utility functions and helpers

use anyhow::Result;
use std::time::Duration;

/// Parse a duration string (e.g., "30s", "5m", "1h")
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Some(num_str) = s.strip_suffix("ms") {
        let millis: u64 = num_str.trim().parse()?;
        Ok(Duration::from_millis(millis))
    } else if let Some(num_str) = s.strip_suffix('s') {
        let secs: u64 = num_str.trim().parse()?;
        Ok(Duration::from_secs(secs))
    } else if let Some(num_str) = s.strip_suffix('m') {
        let mins: u64 = num_str.trim().parse()?;
        Ok(Duration::from_secs(mins * 60))
    } else if let Some(num_str) = s.strip_suffix('h') {
        let hours: u64 = num_str.trim().parse()?;
        Ok(Duration::from_secs(hours * 3600))
    } else {
        // Default to seconds if no suffix
        let secs: u64 = s.parse()?;
        Ok(Duration::from_secs(secs))
    }
}

/// Render a wall-clock duration for log lines and summaries ("1h02m", "3m07s", "4.2s")
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}
