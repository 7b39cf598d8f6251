//! Duration strings.
//!
//! Step timeouts are written as compact unit strings (`30s`, `1m30s`,
//! `250ms`, `1.5h`) and result documents report elapsed time in the same
//! notation, so a value read from one can be pasted into the other.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

/// A complete duration: one or more `<number><unit>` terms.
static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$")
        .expect("DURATION_REGEX must compile")
});

/// A single `<number><unit>` term.
static TERM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d*)(?:\.(\d*))?(ns|us|µs|μs|ms|s|m|h)").expect("TERM_REGEX must compile")
});

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// A duration string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration \"{input}\"")]
pub struct InvalidDuration {
    /// The rejected input
    pub input: String,
}

/// Parse a duration string such as `"1m30s"` or `"250ms"`.
///
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. Terms may
/// carry a decimal fraction. A bare `"0"` is accepted; any other number
/// needs a unit.
pub fn parse_duration(input: &str) -> Result<Duration, InvalidDuration> {
    let invalid = || InvalidDuration {
        input: input.to_string(),
    };
    let s = input.trim();

    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if !DURATION_REGEX.is_match(s) {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    for caps in TERM_REGEX.captures_iter(s) {
        let whole = caps.get(1).map_or("", |m| m.as_str());
        let frac = caps.get(2).map_or("", |m| m.as_str());
        let unit = match caps.get(3).map_or("", |m| m.as_str()) {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => NANOS_PER_MIN,
            "h" => NANOS_PER_HOUR,
            _ => return Err(invalid()),
        };

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(unit).ok_or_else(invalid)?;

        // Digits past nanosecond resolution contribute nothing.
        let frac = &frac[..frac.len().min(18)];
        if !frac.is_empty() {
            let numerator: u128 = frac.parse().map_err(|_| invalid())?;
            let scale = 10u128.pow(frac.len() as u32);
            nanos = nanos
                .checked_add(numerator * unit / scale)
                .ok_or_else(invalid)?;
        }

        total = total.checked_add(nanos).ok_or_else(invalid)?;
    }

    let total = u64::try_from(total).map_err(|_| invalid())?;
    Ok(Duration::from_nanos(total))
}

/// Format a duration as a compact unit string.
///
/// Sub-second values use the largest fitting unit (`850µs`, `12.5ms`);
/// longer values are split into hours, minutes and fractional seconds
/// (`1.204s`, `2m3s`, `1h0m0s`). Zero is `0s`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{}ns", nanos);
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos, NANOS_PER_MICRO, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos, NANOS_PER_MILLI, 6));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let seconds = decimal(nanos % NANOS_PER_MIN, NANOS_PER_SEC, 9);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Render `value / unit` with trailing fractional zeros removed.
fn decimal(value: u128, unit: u128, width: usize) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Serde adapter that writes a [`Duration`] as a [`format_duration`] string.
pub mod serde_str {
    use super::{format_duration, parse_duration};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(D::Error::custom)
    }
}
