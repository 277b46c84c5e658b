//! Remediation effort parsing
//!
//! SonarQube reports issue effort as strings like "1d 2h 30min". The unit
//! suffixes are treated as separators and the remaining numbers are read
//! positionally, so "2h" on its own is a single token and counts as minutes.

use thiserror::Error;

/// Effort string could not be converted to minutes
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedDurationError {
    #[error("Invalid duration: '{input}'. Expected up to three components like '1d 2h 30min'")]
    TokenCount { input: String, tokens: usize },

    #[error("Invalid duration component '{token}' in '{input}'. Components must be whole numbers")]
    InvalidNumber { input: String, token: String },

    #[error("Duration '{input}' is too large to express in minutes")]
    Overflow { input: String },
}

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

/// Convert an effort string to total minutes
///
/// # Examples
///
/// ```
/// use tagtrend::parsing::time_str_to_minutes;
///
/// assert_eq!(time_str_to_minutes("").unwrap(), 0);
/// assert_eq!(time_str_to_minutes("45min").unwrap(), 45);
/// assert_eq!(time_str_to_minutes("2h 30min").unwrap(), 150);
/// assert_eq!(time_str_to_minutes("1d 2h 30min").unwrap(), 1590);
/// ```
pub fn time_str_to_minutes(input: &str) -> Result<u64, MalformedDurationError> {
    if input.is_empty() {
        return Ok(0);
    }

    // "min" must go after "d" and "h" have been blanked, matching the suffix order
    let separated = input.replace('d', " ").replace('h', " ").replace("min", " ");

    let values = separated
        .split_whitespace()
        .map(|token| {
            token.parse::<u64>().map_err(|_| MalformedDurationError::InvalidNumber {
                input: input.to_string(),
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let combine = |days: u64, hours: u64, minutes: u64| {
        days.checked_mul(MINUTES_PER_DAY)
            .and_then(|total| total.checked_add(hours.checked_mul(MINUTES_PER_HOUR)?))
            .and_then(|total| total.checked_add(minutes))
            .ok_or_else(|| MalformedDurationError::Overflow {
                input: input.to_string(),
            })
    };

    match values.as_slice() {
        [minutes] => Ok(*minutes),
        [hours, minutes] => combine(0, *hours, *minutes),
        [days, hours, minutes] => combine(*days, *hours, *minutes),
        other => Err(MalformedDurationError::TokenCount {
            input: input.to_string(),
            tokens: other.len(),
        }),
    }
}
