//! Coded log records: The unit of telemetry sent to the backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codes::LogCode;
use crate::error::ValidationError;

/// Wire format for datetime values, e.g. "2012-12-12 11:11:11".
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Typed value carried by a tag record. Exactly one field is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    String(String),
    Numeric(f64),
    Datetime(DateTime<Utc>),
}

impl Payload {
    /// Name of the comment field this payload populates.
    pub fn field(&self) -> &'static str {
        match self {
            Payload::String(_) => "string",
            Payload::Numeric(_) => "numeric",
            Payload::Datetime(_) => "datetime",
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Payload::String(s) => Value::String(s.clone()),
            Payload::Numeric(n) => serde_json::json!(n),
            Payload::Datetime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
        }
    }
}

/// One telemetry unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub code: LogCode,
    /// Tag key, mandatory for the tag family.
    pub key: Option<String>,
    pub payload: Option<Payload>,
    /// Priority records are always admitted by the transport queue.
    pub priority: bool,
    pub timestamp: DateTime<Utc>,
    /// Code-specific context merged into the comment (page, lat/lng, msgid).
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl LogRecord {
    pub fn new(code: LogCode, timestamp: DateTime<Utc>) -> Self {
        Self {
            code,
            key: None,
            payload: None,
            priority: false,
            timestamp,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Check the key and payload shape against the code.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let code = self.code.code();
        let mismatch = |reason: &str| ValidationError::PayloadMismatch {
            code,
            reason: reason.to_string(),
        };

        if self.code.is_tag_family() {
            let key = self.key.as_deref().unwrap_or_default();
            if key.trim().is_empty() {
                return Err(ValidationError::EmptyKey);
            }
        }

        match (self.code, &self.payload) {
            (LogCode::TagSet, None) => Err(mismatch("tag set requires a value")),
            (LogCode::TagSet, Some(Payload::String(s))) if s.is_empty() => Err(
                ValidationError::EmptyValue(self.key.clone().unwrap_or_default()),
            ),
            (LogCode::TagSet, Some(Payload::Numeric(n))) if !n.is_finite() => Err(
                ValidationError::NonFinite(self.key.clone().unwrap_or_default()),
            ),
            (LogCode::TagSet, Some(_)) => Ok(()),
            (LogCode::TagIncrement, Some(Payload::Numeric(n))) if *n == 1.0 => Ok(()),
            (LogCode::TagIncrement, _) => Err(mismatch("increment carries numeric 1")),
            (_, Some(_)) => Err(mismatch("code carries no tag value")),
            (_, None) => Ok(()),
        }
    }

    /// Build the comment object: attributes, then `key`, then the payload field.
    pub fn comment(&self) -> Value {
        let mut comment: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(key) = &self.key {
            comment.insert("key".to_string(), Value::String(key.clone()));
        }
        if let Some(payload) = &self.payload {
            comment.insert(payload.field().to_string(), payload.to_json());
        }
        Value::Object(comment)
    }

    /// The JSON object posted to the backend for this record.
    pub fn to_wire(&self) -> Value {
        serde_json::json!({
            "code": self.code.code(),
            "created": self.timestamp.format(DATETIME_FORMAT).to_string(),
            "priority": self.priority,
            "comment": self.comment(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 12, 12, 11, 11, 11).unwrap()
    }

    #[test]
    fn tag_without_key_fails_validation() {
        let record = LogRecord::new(LogCode::TagRemove, at());
        assert_eq!(record.validate(), Err(ValidationError::EmptyKey));

        let record = LogRecord::new(LogCode::TagRemove, at()).with_key("  ");
        assert_eq!(record.validate(), Err(ValidationError::EmptyKey));
    }

    #[test]
    fn tag_set_requires_exactly_one_value() {
        let record = LogRecord::new(LogCode::TagSet, at()).with_key("sh_email");
        assert!(matches!(
            record.validate(),
            Err(ValidationError::PayloadMismatch { code: 8999, .. })
        ));

        let record = record.with_payload(Payload::String("a@a.com".into()));
        assert!(record.validate().is_ok());
    }

    #[test]
    fn remove_rejects_payload() {
        let record = LogRecord::new(LogCode::TagRemove, at())
            .with_key("sh_email")
            .with_payload(Payload::Numeric(1.0));
        assert!(record.validate().is_err());
    }

    #[test]
    fn increment_must_be_one() {
        let record = LogRecord::new(LogCode::TagIncrement, at())
            .with_key("visits")
            .with_payload(Payload::Numeric(2.0));
        assert!(record.validate().is_err());
    }

    #[test]
    fn comment_layout() {
        let record = LogRecord::new(LogCode::TagSet, at())
            .with_key("visit_time")
            .with_payload(Payload::Datetime(at()));
        assert_eq!(
            record.comment(),
            serde_json::json!({"key": "visit_time", "datetime": "2012-12-12 11:11:11"})
        );
    }

    #[test]
    fn wire_record_includes_code_and_created() {
        let record = LogRecord::new(LogCode::PageEnter, at()).with_attribute("page", "Home");
        let wire = record.to_wire();
        assert_eq!(wire["code"], 8108);
        assert_eq!(wire["created"], "2012-12-12 11:11:11");
        assert_eq!(wire["comment"]["page"], "Home");
        assert_eq!(wire["priority"], false);
    }
}
