//! Lenient timestamp and optional-string handling for intake payloads.
//!
//! The intake backend writes naive local ISO-8601 stamps (`2024-05-01T08:30:00`)
//! and uses `""` where a value is absent, so both shapes are accepted here.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const SERIALIZE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TAKE_PREFIX: &str = "take_";
const TAKE_STAMP_LEN: usize = 15;

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Extracts the capture time encoded in a take file name such as
/// `take_20240501_083000.m4a`.
pub fn parse_take_stamp(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(TAKE_PREFIX)?.get(..TAKE_STAMP_LEN)?;
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S").ok()
}

/// Serde adapter for `Option<NaiveDateTime>` fields. Unparseable or empty
/// values decode as `None` instead of failing the whole payload.
pub mod lenient {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_timestamp))
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => {
                let text = ts.format(SERIALIZE_FORMAT).to_string();
                serializer.serialize_str(&text)
            }
            None => serializer.serialize_none(),
        }
    }
}

pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_naive_and_offset_forms() {
        let naive = parse_timestamp("2024-05-01T08:30:00").expect("naive");
        assert_eq!((naive.hour(), naive.minute()), (8, 30));

        let offset = parse_timestamp("2024-05-01T08:30:00+08:00").expect("offset");
        assert_eq!(offset.hour(), 8);

        let fractional = parse_timestamp("2024-05-01 08:30:00.250").expect("fractional");
        assert_eq!(fractional.day(), 1);
    }

    #[test]
    fn blank_and_garbage_are_absent() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn take_names_carry_capture_time() {
        let ts = parse_take_stamp("take_20240501_083000.m4a").expect("stamp");
        assert_eq!((ts.year(), ts.month(), ts.second()), (2024, 5, 0));
        assert!(parse_take_stamp("C07_color.m4a").is_none());
        assert!(parse_take_stamp("take_2024.m4a").is_none());
    }
}
