//! Shared value encoding for display and for the wire.
//!
//! Every value that crosses the daemon boundary travels as a string; the
//! `encode_*` functions are the only place that stringification happens so
//! that the resolver and the job/node commands never disagree on a format.

use once_cell::sync::Lazy;
use regex::Regex;
use sched_proto::{UNLIMITED_COUNT, UNLIMITED_TIME_LIMIT_SECS};

use crate::error::CliError;

/// Bytes per MiB.
pub const BYTES_PER_MIB: u64 = 1024 * 1024;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

static TIME_LIMIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)-)?(\d+):(\d+):(\d+)$").unwrap_or_else(|_| unreachable!())
});

/// Convert a byte count to whole MiB, rounding toward zero.
#[must_use]
pub const fn bytes_to_mib(bytes: u64) -> u64 {
    bytes / BYTES_PER_MIB
}

/// Render seconds as `D-HH:MM:SS`, or `HH:MM:SS` below one day.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    let days = secs / SECS_PER_DAY;
    let rem = secs % SECS_PER_DAY;
    let (hh, mm, ss) = (rem / 3600, rem % 3600 / 60, rem % 60);
    if days > 0 {
        format!("{days}-{hh:02}:{mm:02}:{ss:02}")
    } else {
        format!("{hh:02}:{mm:02}:{ss:02}")
    }
}

/// Render a time limit, mapping the sentinel (and anything above it) to `unlimited`.
#[must_use]
pub fn format_time_limit(secs: u64) -> String {
    if is_unlimited_time(secs) {
        "unlimited".to_string()
    } else {
        format_duration(secs)
    }
}

/// Whether a time limit means "no limit".
#[must_use]
pub const fn is_unlimited_time(secs: u64) -> bool {
    secs >= UNLIMITED_TIME_LIMIT_SECS
}

/// Render a count limit, mapping the sentinel to `unlimited`.
#[must_use]
pub fn format_count_limit(count: u32) -> String {
    if count == UNLIMITED_COUNT {
        "unlimited".to_string()
    } else {
        count.to_string()
    }
}

/// Parse a `[D-]HH:MM:SS` time limit into seconds.
///
/// # Errors
///
/// Returns a usage error if the text does not match the pattern or overflows.
pub fn parse_time_limit(text: &str) -> Result<u64, CliError> {
    let caps = TIME_LIMIT_REGEX
        .captures(text.trim())
        .ok_or_else(|| CliError::Usage(format!("time format error: {text}, expected [D-]HH:MM:SS")))?;

    let field = |idx: usize, name: &str| -> Result<u64, CliError> {
        caps.get(idx).map_or(Ok(0), |m| {
            m.as_str()
                .parse::<u64>()
                .map_err(|_| CliError::Usage(format!("the {name} time format error: {text}")))
        })
    };

    let (dd, hh, mm, ss) = (field(1, "day")?, field(2, "hour")?, field(3, "minute")?, field(4, "second")?);

    dd.checked_mul(SECS_PER_DAY)
        .and_then(|d| d.checked_add(hh.checked_mul(3600)?))
        .and_then(|t| t.checked_add(mm.checked_mul(60)?))
        .and_then(|t| t.checked_add(ss))
        .ok_or_else(|| CliError::Usage(format!("time limit out of range: {text}")))
}

/// Wire encoding of an unsigned integer.
#[must_use]
pub fn encode_uint(value: impl Into<u64>) -> String {
    value.into().to_string()
}

/// Wire encoding of a duration in seconds.
#[must_use]
pub fn encode_duration(secs: u64) -> String {
    secs.to_string()
}

/// Wire (and display) encoding of a list: comma joined, order preserved.
#[must_use]
pub fn encode_list(items: &[String]) -> String {
    items.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(0, "00:00:00")]
    #[test_case(59, "00:00:59")]
    #[test_case(3661, "01:01:01")]
    #[test_case(86_400, "1-00:00:00")]
    #[test_case(2 * 86_400 + 5 * 3600 + 7, "2-05:00:07")]
    fn test_format_duration(secs: u64, expected: &str) {
        assert_eq!(format_duration(secs), expected);
    }

    #[test]
    fn test_time_limit_sentinel_is_unlimited() {
        assert_eq!(format_time_limit(UNLIMITED_TIME_LIMIT_SECS), "unlimited");
        assert_eq!(format_time_limit(u64::MAX), "unlimited");
        assert!(format_time_limit(UNLIMITED_TIME_LIMIT_SECS - 1).contains('-'));
    }

    #[test]
    fn test_count_limit_sentinel() {
        assert_eq!(format_count_limit(UNLIMITED_COUNT), "unlimited");
        assert_eq!(format_count_limit(16), "16");
    }

    #[test_case("00:30:00", 1800)]
    #[test_case("2:00:00", 7200)]
    #[test_case("1-00:00:01", 86_401)]
    #[test_case(" 3-12:00:00 ", 3 * 86_400 + 12 * 3600)]
    fn test_parse_time_limit(text: &str, expected: u64) {
        assert_eq!(parse_time_limit(text).expect("valid time"), expected);
    }

    #[test_case("10")]
    #[test_case("1:00")]
    #[test_case("a-01:00:00")]
    #[test_case("01:xx:00")]
    fn test_parse_time_limit_rejects(text: &str) {
        let err = parse_time_limit(text).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_parse_time_limit_overflow() {
        let err = parse_time_limit("99999999999999999999-00:00:00").unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_encoders() {
        assert_eq!(encode_uint(42_u32), "42");
        assert_eq!(encode_duration(UNLIMITED_TIME_LIMIT_SECS), "315576000000");
        assert_eq!(encode_list(&["cpu".into(), "gpu".into()]), "cpu,gpu");
        assert_eq!(encode_list(&[]), "");
    }

    proptest! {
        #[test]
        fn bytes_to_mib_truncates(bytes in any::<u64>()) {
            let mib = bytes_to_mib(bytes);
            prop_assert!(mib * BYTES_PER_MIB <= bytes);
            prop_assert!(bytes - mib * BYTES_PER_MIB < BYTES_PER_MIB);
        }

        #[test]
        fn duration_round_trips_through_parser(secs in 0_u64..10_000_000_000) {
            prop_assert_eq!(parse_time_limit(&format_duration(secs)).unwrap(), secs);
        }
    }
}
