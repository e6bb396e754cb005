use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

/// Canonical wire form: UTC, whole seconds, literal trailing `Z`.
const CANONICAL: &str = "%Y-%m-%dT%H:%M:%SZ";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 date-time. Accepts RFC 3339 (offset or `Z`),
/// timezone-naive forms (interpreted as UTC), and a bare date (midnight
/// UTC). The result is truncated to whole seconds.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(truncate(dt.with_timezone(&Utc)));
    }
    // Offset forms without a seconds component are not RFC 3339.
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M%:z") {
        return Some(truncate(dt.with_timezone(&Utc)));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(truncate(Utc.from_utc_datetime(&naive)));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

/// Render a timestamp in the canonical form.
pub fn render_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(CANONICAL).to_string()
}

fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Serde module for `Option<DateTime<Utc>>` fields carried in the
/// canonical string form.
pub mod canonical_option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_some(&super::render_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => super::parse_timestamp(&s).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("'{s}' is not an ISO-8601 date-time"))
            }),
            None => Ok(None),
        }
    }
}
