//! Time utilities: HH:MM parsing, record duration computation, minute formatting.

use crate::errors::{AppError, AppResult};
use chrono::NaiveTime;

const MINUTES_PER_DAY: i64 = 24 * 60;

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t, "%H:%M").ok()
}

/// Strict validation used by the CLI before a record is built.
pub fn validate_time(t: &str) -> AppResult<String> {
    parse_time(t)
        .map(|tm| tm.format("%H:%M").to_string())
        .ok_or_else(|| AppError::InvalidTime(t.to_string()))
}

/// Lenient "HH:MM" → minutes since midnight; unparsable parts, and values
/// too large to represent, count as 0.
fn to_minutes(t: &str) -> i64 {
    let mut parts = t.split(':').map(|p| p.trim().parse::<i64>().unwrap_or(0));
    let h = parts.next().unwrap_or(0);
    let m = parts.next().unwrap_or(0);
    h.checked_mul(60).and_then(|hm| hm.checked_add(m)).unwrap_or(0)
}

/// Minutes from `start` to `end`. An end earlier than the start is taken as
/// crossing midnight: ("23:30", "00:15") → 45.
pub fn calculate_duration_minutes(start: &str, end: &str) -> u32 {
    let diff = to_minutes(end).checked_sub(to_minutes(start)).unwrap_or(0);
    let wrapped = if diff >= 0 { diff } else { diff + MINUTES_PER_DAY };
    u32::try_from(wrapped.clamp(0, MINUTES_PER_DAY)).unwrap_or(0)
}

/// 0 → "0m", 45 → "45m", 120 → "2h", 75 → "1h 15m".
pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, 0) => "0m".to_string(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
