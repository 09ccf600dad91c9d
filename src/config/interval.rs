/// Parse interval string like "1h", "30m", "90s", "1d" into seconds
pub fn parse_interval(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();

    if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, 3600).ok_or_else(|| format!("Invalid hours: {}", hours))
    } else if let Some(minutes) = s.strip_suffix('m') {
        scaled(minutes, 60).ok_or_else(|| format!("Invalid minutes: {}", minutes))
    } else if let Some(days) = s.strip_suffix('d') {
        scaled(days, 86400).ok_or_else(|| format!("Invalid days: {}", days))
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        // Bare numbers are seconds
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '90s', '5m', '1h'", s))
    }
}

// None on parse failure or overflow
fn scaled(value: &str, unit: u64) -> Option<u64> {
    value.parse::<u64>().ok()?.checked_mul(unit)
}

/// Format interval for log lines
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
