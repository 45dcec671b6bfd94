//! Field deserializers shared by the record types.
//!
//! The API is loose about a few field encodings: bounce codes arrive as
//! numbers or numeric strings, and dates arrive as RFC 2822 strings with a
//! `GMT`/`UTC` zone name or as RFC 3339.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Parses an API date string.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }

    let rfc2822 = match value.rsplit_once(' ') {
        Some((head, "GMT" | "UTC" | "UT" | "Z")) => format!("{} +0000", head),
        _ => value.to_string(),
    };

    DateTime::parse_from_rfc2822(&rfc2822)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Deserializes an optional date; absent or null is `None`.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(u64),
    Text(String),
}

/// Deserializes a status code sent as a number or a numeric string.
///
/// Absent or null is `None`; anything non-numeric is an error.
pub fn deserialize_code<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<LooseNumber>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(LooseNumber::Number(number)) => number,
        Some(LooseNumber::Text(text)) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("code is not numeric: {:?}", text)))?,
    };

    u16::try_from(number)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("code out of range: {}", number)))
}
