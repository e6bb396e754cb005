use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ValidationError;
use crate::time;

/// Stored form of a task: one JSON object per document, addressed by its id.
/// The id lives in the document key, never in the body.
pub type Document = serde_json::Map<String, Value>;

pub const MIN_DURATION: i64 = 15;
pub const MAX_DURATION: i64 = 180;
pub const DEFAULT_DURATION: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub duration: i64,
    #[serde(default, with = "time::canonical_option")]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

/// Recurrence rule for a task. `Custom` carries weekday indices 0-6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Weekdays,
    Weekends,
    Custom { days: Vec<u8> },
}

const RECURRENCE_KINDS: &str = "none, daily, weekly, weekdays, weekends, custom";

impl Recurrence {
    /// Validate a raw recurrence value.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let Some(map) = value.as_object() else {
            return Err(ValidationError::new("recurrence", "must be an object"));
        };
        let kind = map.get("type").and_then(Value::as_str).ok_or_else(|| {
            ValidationError::new(
                "recurrence.type",
                format!("must be one of {RECURRENCE_KINDS}"),
            )
        })?;
        match kind {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "weekdays" => Ok(Self::Weekdays),
            "weekends" => Ok(Self::Weekends),
            "custom" => {
                let days = map.get("days").and_then(Value::as_array).ok_or_else(|| {
                    ValidationError::new(
                        "recurrence.days",
                        "custom recurrence requires a list of weekday indices",
                    )
                })?;
                let mut parsed = Vec::with_capacity(days.len());
                for day in days {
                    let index = day.as_i64().filter(|d| (0..=6).contains(d)).ok_or_else(|| {
                        ValidationError::new(
                            "recurrence.days",
                            "weekday indices must be integers between 0 and 6",
                        )
                    })?;
                    parsed.push(index as u8);
                }
                Ok(Self::Custom { days: parsed })
            }
            other => Err(ValidationError::new(
                "recurrence.type",
                format!("'{other}' is not one of {RECURRENCE_KINDS}"),
            )),
        }
    }

    /// Stored document form.
    pub fn to_value(&self) -> Value {
        match self {
            Self::None => json!({"type": "none"}),
            Self::Daily => json!({"type": "daily"}),
            Self::Weekly => json!({"type": "weekly"}),
            Self::Weekdays => json!({"type": "weekdays"}),
            Self::Weekends => json!({"type": "weekends"}),
            Self::Custom { days } => json!({"type": "custom", "days": days}),
        }
    }
}

impl Task {
    /// Reshape a stored document into the canonical response form, filling
    /// defaults for fields that older, sparser records never wrote.
    pub fn from_document(id: &str, doc: &Document) -> Result<Self, ValidationError> {
        let title = doc
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ValidationError::new("title", "missing or empty in stored record"))?
            .to_string();

        let duration = match doc.get("duration") {
            None | Some(Value::Null) => DEFAULT_DURATION,
            Some(value) => value.as_i64().ok_or_else(|| {
                ValidationError::new("duration", "stored value is not an integer")
            })?,
        };

        let scheduled_start = match doc.get("scheduledStart") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let raw = value.as_str().ok_or_else(|| {
                    ValidationError::new("scheduledStart", "stored value is not a string")
                })?;
                Some(time::parse_timestamp(raw).ok_or_else(|| {
                    ValidationError::new("scheduledStart", "stored value is not an ISO-8601 date-time")
                })?)
            }
        };

        let recurrence = match doc.get("recurrence") {
            None | Some(Value::Null) => None,
            Some(value) => Some(Recurrence::from_value(value)?),
        };

        Ok(Self {
            id: id.to_string(),
            title,
            duration,
            scheduled_start,
            recurrence,
        })
    }
}
