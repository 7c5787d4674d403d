//! Human-readable sizes, rates and durations for transfer views.

use std::time::Duration;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// `1536` -> `"1.50 KB"`. Bytes below 1 KB are printed without decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

pub fn format_speed(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
        return "0 B/s".to_string();
    }
    format!("{}/s", format_file_size(bytes_per_sec.round() as u64))
}

/// `None` renders as `"--"`.
pub fn format_remaining(remaining: Option<Duration>) -> String {
    let Some(remaining) = remaining else {
        return "--".to_string();
    };
    let secs = remaining.as_secs_f64().ceil() as u64;
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m {}s", secs / 60, secs % 60),
        _ => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_speed() {
        assert_eq!(format_speed(0.0), "0 B/s");
        assert_eq!(format_speed(f64::NAN), "0 B/s");
        assert_eq!(format_speed(2048.0), "2.00 KB/s");
    }

    #[test]
    fn test_remaining() {
        assert_eq!(format_remaining(None), "--");
        assert_eq!(format_remaining(Some(Duration::from_secs(42))), "42s");
        assert_eq!(format_remaining(Some(Duration::from_secs(125))), "2m 5s");
        assert_eq!(format_remaining(Some(Duration::from_secs(7260))), "2h 1m");
    }
}
