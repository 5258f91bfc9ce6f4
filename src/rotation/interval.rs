//! Age intervals like `1M3W4h2s`
//!
//! A sequence of `<count><unit>` chunks, counts strictly positive. Units:
//! `s` seconds, `m` minutes, `h` hours, `D` days, `W` weeks, `M` 30 days,
//! `Y` 365 days.

use chrono::Duration;

use crate::error::{StashError, StashResult};

fn unit_seconds(unit: char) -> Option<i64> {
    match unit {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3_600),
        'D' => Some(86_400),
        'W' => Some(7 * 86_400),
        'M' => Some(30 * 86_400),
        'Y' => Some(365 * 86_400),
        _ => None,
    }
}

/// Parse an interval string into a duration
pub fn parse_interval(input: &str) -> StashResult<Duration> {
    let bad = || StashError::Validation(format!("Bad interval format for '{}'", input));

    if input.is_empty() {
        return Err(bad());
    }

    let mut total: i64 = 0;
    let mut digits = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let per_unit = unit_seconds(c).ok_or_else(bad)?;
        let count: i64 = digits.parse().map_err(|_| bad())?;
        if count == 0 {
            return Err(bad());
        }
        total = count
            .checked_mul(per_unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(bad)?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(bad());
    }
    Duration::try_seconds(total).ok_or_else(bad)
}
