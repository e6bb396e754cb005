use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::ValidationError;
use crate::model::{Document, Recurrence, DEFAULT_DURATION, MAX_DURATION, MIN_DURATION};
use crate::time;

/// A validated, fully-defaulted new task, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    /// Client-supplied id, if any; the store generates one otherwise.
    pub id: Option<String>,
    pub title: String,
    pub duration: i64,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub recurrence: Option<Recurrence>,
}

/// A validated partial update. Outer `None` means the field was not
/// supplied; for the nullable fields an inner `None` clears the stored
/// value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub duration: Option<i64>,
    pub scheduled_start: Option<Option<DateTime<Utc>>>,
    pub recurrence: Option<Option<Recurrence>>,
}

/// Validate raw create input. Partial input is accepted: a missing or zero
/// duration becomes the default before bounds checking, missing optionals
/// stay absent. The first failing field surfaces immediately.
pub fn validate_new_task(raw: &Value) -> Result<NewTask, ValidationError> {
    let body = as_object(raw)?;

    let id = match body.get("id") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let id = value
                .as_str()
                .ok_or_else(|| ValidationError::new("id", "must be a string"))?;
            // An empty client id means "let the store pick one".
            if id.is_empty() {
                None
            } else {
                Some(id.to_string())
            }
        }
    };

    let title = required_title(body.get("title"))?;

    let duration = match body.get("duration") {
        None => DEFAULT_DURATION,
        Some(value) => {
            let minutes = integer_duration(value)?;
            if minutes == 0 {
                DEFAULT_DURATION
            } else {
                bounded_duration(minutes)?
            }
        }
    };

    let scheduled_start = optional_timestamp(body.get("scheduledStart"))?;
    let recurrence = optional_recurrence(body.get("recurrence"))?;

    Ok(NewTask {
        id,
        title,
        duration,
        scheduled_start,
        recurrence,
    })
}

/// Validate raw update input. Only supplied fields are carried; a supplied
/// duration must satisfy the bounds itself (no defaulting on this path).
/// `null` clears `scheduledStart`/`recurrence` but is rejected for the
/// non-nullable fields. An `id` key is ignored: ids are immutable.
pub fn validate_task_patch(raw: &Value) -> Result<TaskPatch, ValidationError> {
    let body = as_object(raw)?;
    let mut patch = TaskPatch::default();

    if let Some(value) = body.get("title") {
        if value.is_null() {
            return Err(ValidationError::new("title", "must be a non-empty string"));
        }
        patch.title = Some(required_title(Some(value))?);
    }
    if let Some(value) = body.get("duration") {
        patch.duration = Some(bounded_duration(integer_duration(value)?)?);
    }
    if let Some(value) = body.get("scheduledStart") {
        patch.scheduled_start = Some(if value.is_null() {
            None
        } else {
            optional_timestamp(Some(value))?
        });
    }
    if let Some(value) = body.get("recurrence") {
        patch.recurrence = Some(if value.is_null() {
            None
        } else {
            Some(Recurrence::from_value(value)?)
        });
    }

    Ok(patch)
}

impl NewTask {
    /// Stored document form. Absent optionals are omitted; the id is the
    /// document key, never part of the body.
    pub fn document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("title".into(), Value::String(self.title.clone()));
        doc.insert("duration".into(), Value::from(self.duration));
        if let Some(start) = &self.scheduled_start {
            doc.insert(
                "scheduledStart".into(),
                Value::String(time::render_timestamp(start)),
            );
        }
        if let Some(recurrence) = &self.recurrence {
            doc.insert("recurrence".into(), recurrence.to_value());
        }
        doc
    }
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.duration.is_none()
            && self.scheduled_start.is_none()
            && self.recurrence.is_none()
    }

    /// Merge document: only supplied fields, with `null` for explicit clears.
    pub fn document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(title) = &self.title {
            doc.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(duration) = self.duration {
            doc.insert("duration".into(), Value::from(duration));
        }
        if let Some(start) = &self.scheduled_start {
            let value = match start {
                Some(ts) => Value::String(time::render_timestamp(ts)),
                None => Value::Null,
            };
            doc.insert("scheduledStart".into(), value);
        }
        if let Some(recurrence) = &self.recurrence {
            let value = match recurrence {
                Some(r) => r.to_value(),
                None => Value::Null,
            };
            doc.insert("recurrence".into(), value);
        }
        doc
    }
}

fn as_object(raw: &Value) -> Result<&Document, ValidationError> {
    raw.as_object()
        .ok_or_else(|| ValidationError::new("body", "must be a JSON object"))
}

fn required_title(value: Option<&Value>) -> Result<String, ValidationError> {
    let title = value
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::new("title", "must be a non-empty string"))?;
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            "title",
            "must not be empty or whitespace-only",
        ));
    }
    Ok(trimmed.to_string())
}

fn integer_duration(value: &Value) -> Result<i64, ValidationError> {
    value
        .as_i64()
        .ok_or_else(|| ValidationError::new("duration", "must be an integer number of minutes"))
}

fn bounded_duration(minutes: i64) -> Result<i64, ValidationError> {
    if (MIN_DURATION..=MAX_DURATION).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::new(
            "duration",
            format!("must be between {MIN_DURATION} and {MAX_DURATION} minutes"),
        ))
    }
}

fn optional_timestamp(value: Option<&Value>) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let raw = value.as_str().ok_or_else(|| {
                ValidationError::new("scheduledStart", "must be an ISO-8601 date-time string")
            })?;
            time::parse_timestamp(raw).map(Some).ok_or_else(|| {
                ValidationError::new(
                    "scheduledStart",
                    format!("'{raw}' is not an ISO-8601 date-time"),
                )
            })
        }
    }
}

fn optional_recurrence(value: Option<&Value>) -> Result<Option<Recurrence>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Recurrence::from_value(value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::render_timestamp;
    use serde_json::json;

    #[test]
    fn title_is_trimmed() {
        let task = validate_new_task(&json!({"title": "  Buy milk  "})).unwrap();
        assert_eq!(task.title, "Buy milk");
    }

    #[test]
    fn whitespace_only_title_fails() {
        let err = validate_new_task(&json!({"title": "   "})).unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn missing_title_fails() {
        let err = validate_new_task(&json!({"duration": 45})).unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn duration_defaults_to_sixty() {
        let task = validate_new_task(&json!({"title": "Walk"})).unwrap();
        assert_eq!(task.duration, DEFAULT_DURATION);
    }

    #[test]
    fn zero_duration_defaults_on_create() {
        let task = validate_new_task(&json!({"title": "Walk", "duration": 0})).unwrap();
        assert_eq!(task.duration, DEFAULT_DURATION);
    }

    #[test]
    fn duration_bounds_are_inclusive() {
        for minutes in [MIN_DURATION, MAX_DURATION] {
            let task =
                validate_new_task(&json!({"title": "Edge", "duration": minutes})).unwrap();
            assert_eq!(task.duration, minutes);
        }
        for minutes in [MIN_DURATION - 1, MAX_DURATION + 1, 1000] {
            let err =
                validate_new_task(&json!({"title": "Edge", "duration": minutes})).unwrap_err();
            assert_eq!(err.field, "duration");
        }
    }

    #[test]
    fn non_integer_duration_fails() {
        for bad in [json!("sixty"), json!(45.5), json!(null), json!(true)] {
            let err = validate_new_task(&json!({"title": "Walk", "duration": bad})).unwrap_err();
            assert_eq!(err.field, "duration");
        }
    }

    #[test]
    fn scheduled_start_normalizes() {
        let task =
            validate_new_task(&json!({"title": "Call", "scheduledStart": "2025-11-07T10:00"}))
                .unwrap();
        let start = task.scheduled_start.unwrap();
        assert_eq!(render_timestamp(&start), "2025-11-07T10:00:00Z");
    }

    #[test]
    fn scheduled_start_absent_or_null_is_fine() {
        assert_eq!(
            validate_new_task(&json!({"title": "Call"})).unwrap().scheduled_start,
            None
        );
        assert_eq!(
            validate_new_task(&json!({"title": "Call", "scheduledStart": null}))
                .unwrap()
                .scheduled_start,
            None
        );
    }

    #[test]
    fn bad_scheduled_start_fails() {
        let err =
            validate_new_task(&json!({"title": "Call", "scheduledStart": "not-a-date"}))
                .unwrap_err();
        assert_eq!(err.field, "scheduledStart");
    }

    #[test]
    fn recurrence_kinds_accepted() {
        for kind in ["none", "daily", "weekly", "weekdays", "weekends"] {
            let task =
                validate_new_task(&json!({"title": "Gym", "recurrence": {"type": kind}}))
                    .unwrap();
            assert!(task.recurrence.is_some(), "{kind} should be accepted");
        }
    }

    #[test]
    fn custom_recurrence_validated() {
        let task = validate_new_task(
            &json!({"title": "Gym", "recurrence": {"type": "custom", "days": [1, 3, 5]}}),
        )
        .unwrap();
        assert_eq!(
            task.recurrence,
            Some(Recurrence::Custom { days: vec![1, 3, 5] })
        );
        let err = validate_new_task(
            &json!({"title": "Gym", "recurrence": {"type": "custom", "days": ["mon"]}}),
        )
        .unwrap_err();
        assert_eq!(err.field, "recurrence.days");
    }

    #[test]
    fn client_id_passes_through() {
        let task = validate_new_task(&json!({"id": "my-id", "title": "Named"})).unwrap();
        assert_eq!(task.id.as_deref(), Some("my-id"));
    }

    #[test]
    fn empty_client_id_means_generate() {
        let task = validate_new_task(&json!({"id": "", "title": "Named"})).unwrap();
        assert_eq!(task.id, None);
    }

    #[test]
    fn non_string_id_fails() {
        let err = validate_new_task(&json!({"id": 7, "title": "Named"})).unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn non_object_body_fails() {
        assert!(validate_new_task(&json!("just a string")).is_err());
        assert!(validate_task_patch(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn new_task_document_omits_absent_optionals() {
        let task = validate_new_task(&json!({"title": "Walk"})).unwrap();
        let doc = task.document();
        assert_eq!(doc.get("title"), Some(&json!("Walk")));
        assert_eq!(doc.get("duration"), Some(&json!(60)));
        assert!(!doc.contains_key("scheduledStart"));
        assert!(!doc.contains_key("recurrence"));
        assert!(!doc.contains_key("id"));
    }

    #[test]
    fn new_task_document_renders_canonical_timestamp() {
        let task = validate_new_task(
            &json!({"title": "Call", "scheduledStart": "2025-11-07T10:00:00+02:00"}),
        )
        .unwrap();
        let doc = task.document();
        assert_eq!(doc.get("scheduledStart"), Some(&json!("2025-11-07T08:00:00Z")));
    }

    #[test]
    fn patch_keeps_only_supplied_fields() {
        let patch = validate_task_patch(&json!({"title": "Updated"})).unwrap();
        assert_eq!(patch.title.as_deref(), Some("Updated"));
        assert_eq!(patch.duration, None);
        assert_eq!(patch.scheduled_start, None);
        assert_eq!(patch.recurrence, None);
        let doc = patch.document();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn patch_duration_gets_no_default() {
        for bad in [0, 14, 181] {
            let err = validate_task_patch(&json!({"duration": bad})).unwrap_err();
            assert_eq!(err.field, "duration");
        }
        let patch = validate_task_patch(&json!({"duration": 90})).unwrap();
        assert_eq!(patch.duration, Some(90));
    }

    #[test]
    fn patch_null_title_fails() {
        let err = validate_task_patch(&json!({"title": null})).unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn patch_null_clears_nullable_fields() {
        let patch =
            validate_task_patch(&json!({"scheduledStart": null, "recurrence": null})).unwrap();
        assert_eq!(patch.scheduled_start, Some(None));
        assert_eq!(patch.recurrence, Some(None));
        let doc = patch.document();
        assert_eq!(doc.get("scheduledStart"), Some(&Value::Null));
        assert_eq!(doc.get("recurrence"), Some(&Value::Null));
    }

    #[test]
    fn patch_ignores_id_and_unknown_fields() {
        let patch =
            validate_task_patch(&json!({"id": "other", "completed": true})).unwrap();
        assert!(patch.is_empty());
        assert!(patch.document().is_empty());
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(validate_task_patch(&json!({})).unwrap().is_empty());
    }
}
