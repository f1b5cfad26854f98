//! Lenient timestamp parsing for inbound JSON.
//!
//! Accepts RFC 3339 strings, naive ISO-8601 datetimes (read as UTC), bare
//! dates (midnight UTC) and integer Unix seconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Seconds(i64),
    Text(String),
}

/// Parse a timestamp string in any of the accepted shapes.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    if let Ok(secs) = raw.parse::<i64>() {
        return Utc.timestamp_opt(secs, 0).single();
    }
    None
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawTimestamp> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(RawTimestamp::Seconds(secs)) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {secs}"))),
            Some(RawTimestamp::Text(text)) => parse_timestamp(&text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {text:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, with = "option")]
        at: Option<DateTime<Utc>>,
    }

    fn probe(json: &str) -> Option<i64> {
        serde_json::from_str::<Probe>(json)
            .unwrap()
            .at
            .map(|dt| dt.timestamp())
    }

    #[test]
    fn rfc3339_with_offset() {
        assert_eq!(probe(r#"{"at": "2024-01-01T01:00:00+01:00"}"#), Some(1704067200));
    }

    #[test]
    fn naive_datetime_is_utc() {
        assert_eq!(probe(r#"{"at": "2024-01-01T00:00:00"}"#), Some(1704067200));
        assert_eq!(probe(r#"{"at": "2024-01-01 00:00:00.5"}"#), Some(1704067200));
    }

    #[test]
    fn bare_date_is_midnight() {
        assert_eq!(probe(r#"{"at": "2024-01-01"}"#), Some(1704067200));
    }

    #[test]
    fn integer_seconds() {
        assert_eq!(probe(r#"{"at": 1704067200}"#), Some(1704067200));
        assert_eq!(probe(r#"{"at": "1704067200"}"#), Some(1704067200));
    }

    #[test]
    fn missing_and_null() {
        assert_eq!(probe(r#"{}"#), None);
        assert_eq!(probe(r#"{"at": null}"#), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Probe>(r#"{"at": "next tuesday"}"#).is_err());
    }
}
