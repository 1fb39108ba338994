//! # Duration Parsing
//!
//! Parses Go-style duration strings such as `"30s"`, `"5m"`, `"1h30m"` or
//! `"1.5h"`. Supported units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h` and `d`.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("duration string cannot be empty")]
    Empty,
    #[error("invalid duration '{0}'; expected e.g. '30s', '5m', '1h30m'")]
    Invalid(String),
    #[error("duration '{0}' must be greater than zero")]
    NotPositive(String),
}

static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<number>\d+(?:\.\d*)?|\.\d+)(?P<unit>ns|us|µs|μs|ms|s|m|h|d)")
        .expect("Failed to compile duration segment regex - this should never happen")
});

/// Largest representable duration, roughly 584 years
const MAX_NANOS: f64 = 18_446_744_073_709_551_615.0;

fn unit_nanos(unit: &str) -> Option<f64> {
    let nanos = match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        "h" => 3_600e9,
        "d" => 86_400e9,
        _ => return None,
    };
    Some(nanos)
}

/// Parse a duration string into a positive `Duration`
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }
    let invalid = || DurationError::Invalid(trimmed.to_string());

    let (negative, body) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if body.is_empty() {
        return Err(invalid());
    }

    // Bare zero is the only unit-less value accepted (and then rejected as not positive)
    if body == "0" {
        return Err(DurationError::NotPositive(trimmed.to_string()));
    }

    let mut consumed = 0;
    let mut total_nanos = 0.0_f64;
    for captures in SEGMENT.captures_iter(body) {
        let (Some(whole), Some(number), Some(unit)) =
            (captures.get(0), captures.name("number"), captures.name("unit"))
        else {
            return Err(invalid());
        };
        // Segments must be contiguous: "5mfoo3s" is rejected
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let value = number.as_str().parse::<f64>().ok().ok_or_else(invalid)?;
        let scale = unit_nanos(unit.as_str()).ok_or_else(invalid)?;
        total_nanos += value * scale;
    }
    if consumed != body.len() {
        return Err(invalid());
    }

    let total_nanos = total_nanos.round();
    if negative || total_nanos < 1.0 {
        return Err(DurationError::NotPositive(trimmed.to_string()));
    }
    if total_nanos >= MAX_NANOS {
        return Err(invalid());
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "bounded to (0, MAX_NANOS) above"
    )]
    let nanos = total_nanos as u64;
    Ok(Duration::from_nanos(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_units() {
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7_200)));
        assert_eq!(parse_duration("1d"), Ok(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    }

    #[test]
    fn test_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5_400)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5_400)));
        assert_eq!(parse_duration(" 2m10s "), Ok(Duration::from_secs(130)));
        assert_eq!(parse_duration("+1m"), Ok(Duration::from_secs(60)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(
            parse_duration("notaduration"),
            Err(DurationError::Invalid("notaduration".to_string()))
        );
        assert!(matches!(parse_duration("5"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("5m foo"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("m"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("5x"), Err(DurationError::Invalid(_))));
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
    }

    #[test]
    fn test_segment_regex_is_shared() {
        assert!(SEGMENT.is_match("5m"));
        assert_eq!(parse_duration("10m"), parse_duration("10m"));
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(parse_duration("0s"), Err(DurationError::NotPositive(_))));
        assert!(matches!(parse_duration("0"), Err(DurationError::NotPositive(_))));
        assert!(matches!(parse_duration("-5m"), Err(DurationError::NotPositive(_))));
    }
}
