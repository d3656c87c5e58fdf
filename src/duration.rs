//! Human-readable durations ("40s", "3m", "1h") for configuration files.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Parse a duration string with a `d`, `h`, `m` or `s` suffix.
///
/// ```
/// use assetsync::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("40s").unwrap(), Duration::from_secs(40));
/// assert_eq!(parse_duration(" 3M ").unwrap(), Duration::from_secs(180));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let Some(unit) = s.chars().last() else {
        anyhow::bail!("Duration is empty");
    };

    let multiplier = match unit {
        'd' => SECS_PER_DAY,
        'h' => SECS_PER_HOUR,
        'm' => SECS_PER_MINUTE,
        's' => 1,
        _ => anyhow::bail!("Duration must end with d, h, m, or s"),
    };

    let num: u64 = s[..s.len() - 1]
        .trim()
        .parse()
        .with_context(|| format!("Invalid number in duration: {s}"))?;

    let secs = num
        .checked_mul(multiplier)
        .context("Duration is too large")?;
    Ok(Duration::from_secs(secs))
}

/// Format a duration using the largest unit that divides it evenly.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        s if s >= SECS_PER_DAY && s % SECS_PER_DAY == 0 => format!("{}d", s / SECS_PER_DAY),
        s if s >= SECS_PER_HOUR && s % SECS_PER_HOUR == 0 => format!("{}h", s / SECS_PER_HOUR),
        s if s >= SECS_PER_MINUTE && s % SECS_PER_MINUTE == 0 => {
            format!("{}m", s / SECS_PER_MINUTE)
        }
        s => format!("{s}s"),
    }
}

/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}

/// Use with `#[serde(serialize_with = "serialize_duration")]`.
pub fn serialize_duration<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("3m").unwrap(), Duration::from_secs(180));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("xs").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn formats_with_largest_unit() {
        assert_eq!(format_duration(Duration::from_secs(40)), "40s");
        assert_eq!(format_duration(Duration::from_secs(180)), "3m");
        assert_eq!(format_duration(Duration::from_secs(90)), "90s");
        assert_eq!(format_duration(Duration::from_secs(86400)), "1d");
    }
}
