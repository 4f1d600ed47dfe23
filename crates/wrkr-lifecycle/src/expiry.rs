//! Approval expiry parsing.
//!
//! Accepted forms:
//!
//! | Input            | Meaning                      |
//! |------------------|------------------------------|
//! | `""`             | 90 days from now             |
//! | `30d`            | whole days                   |
//! | `720h`, `1h30m`  | Go-style duration            |
//!
//! Go-style units are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`, and each
//! component may carry a fractional part (`1.5h`).

use chrono::{DateTime, Duration, Utc};

use wrkr_contracts::error::{WrkrError, WrkrResult};

/// Validity window of an approval given without an explicit expiry.
pub const DEFAULT_APPROVAL_DAYS: i64 = 90;

/// Resolve an operator-supplied expiry into an absolute instant.
pub fn parse_expiry(raw: &str, now: DateTime<Utc>) -> WrkrResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| WrkrError::InvalidExpiry {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let window = if trimmed.is_empty() {
        Duration::days(DEFAULT_APPROVAL_DAYS)
    } else if let Some(days) = trimmed.strip_suffix('d') {
        let days: i64 = days
            .parse()
            .map_err(|_| invalid("expected a whole number of days before 'd'"))?;
        Duration::try_days(days).ok_or_else(|| invalid("day count out of range"))?
    } else {
        parse_duration(trimmed).ok_or_else(|| invalid("expected a duration such as 720h or 30d"))?
    };

    if window <= Duration::zero() {
        return Err(invalid("expiry must be in the future"));
    }
    now.checked_add_signed(window)
        .ok_or_else(|| invalid("expiry out of range"))
}

/// Parse a Go-style duration string (`1h30m`, `-45s`, `1.5h`).
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let (negative, mut rest) = match raw.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if rest == "0" {
        return Some(Duration::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        if number.is_empty() || number == "." {
            return None;
        }
        let value: f64 = number.parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_end..];
        nanos += value * scale;
    }

    if !nanos.is_finite() || nanos >= i64::MAX as f64 {
        return None;
    }
    let duration = Duration::nanoseconds(nanos.round() as i64);
    Some(if negative { -duration } else { duration })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_defaults_to_ninety_days() {
        assert_eq!(parse_expiry("", now()).unwrap(), now() + Duration::days(90));
        assert_eq!(parse_expiry("  ", now()).unwrap(), now() + Duration::days(90));
    }

    #[test]
    fn test_day_suffix() {
        assert_eq!(parse_expiry("30d", now()).unwrap(), now() + Duration::days(30));
    }

    #[test]
    fn test_go_durations() {
        assert_eq!(parse_expiry("720h", now()).unwrap(), now() + Duration::hours(720));
        assert_eq!(
            parse_expiry("1h30m", now()).unwrap(),
            now() + Duration::minutes(90)
        );
        assert_eq!(parse_duration("1.5h"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("250ms"), Some(Duration::milliseconds(250)));
        assert_eq!(parse_duration("-45s"), Some(Duration::seconds(-45)));
        assert_eq!(parse_duration("0"), Some(Duration::zero()));
    }

    #[test]
    fn test_malformed_expiry_is_rejected() {
        for raw in ["soon", "d", "1.5d", "10x", "h", "12", "-5d", "0s", "-1h"] {
            let err = parse_expiry(raw, now()).unwrap_err();
            assert!(
                matches!(err, WrkrError::InvalidExpiry { .. }),
                "{raw}: got {err:?}"
            );
        }
    }
}
