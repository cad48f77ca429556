//! Tag/event codec: Turns a logical action into a coded log record.
//!
//! | Action          | Code | Comment                               |
//! |-----------------|------|---------------------------------------|
//! | tag string      | 8999 | `{key, string: value}`                |
//! | tag numeric     | 8999 | `{key, numeric: value}`               |
//! | tag datetime    | 8999 | `{key, datetime: value}`              |
//! | remove tag      | 8998 | `{key}`                               |
//! | increment tag   | 8997 | `{key, numeric: 1}`                   |
//! | page enter/exit | 8108 / 8109 | `{page}`                       |
//! | heartbeat       | 8051 | `{}` (priority)                       |
//! | location ping   | 19   | `{lat, lng}`                          |
//! | push result     | 8202 | `{msgid, code, result}`               |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codes::LogCode;
use crate::error::ValidationError;
use crate::record::{LogRecord, Payload};

/// A device location fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// How the user responded to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushResult {
    Accepted,
    Declined,
    Postponed,
    Ignored,
}

impl PushResult {
    pub fn label(self) -> &'static str {
        match self {
            PushResult::Accepted => "accepted",
            PushResult::Declined => "declined",
            PushResult::Postponed => "postponed",
            PushResult::Ignored => "ignored",
        }
    }
}

/// A logical action that produces exactly one log record.
#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    TagString { key: String, value: String },
    TagNumeric { key: String, value: f64 },
    TagDatetime { key: String, value: DateTime<Utc> },
    RemoveTag { key: String },
    IncrementTag { key: String },
    PageEnter { page: String },
    PageExit { page: String },
    Heartbeat,
    LocationPing { location: GeoPoint },
    PushResult { msgid: String, code: u32, result: PushResult },
}

impl EventAction {
    pub fn code(&self) -> LogCode {
        match self {
            EventAction::TagString { .. }
            | EventAction::TagNumeric { .. }
            | EventAction::TagDatetime { .. } => LogCode::TagSet,
            EventAction::RemoveTag { .. } => LogCode::TagRemove,
            EventAction::IncrementTag { .. } => LogCode::TagIncrement,
            EventAction::PageEnter { .. } => LogCode::PageEnter,
            EventAction::PageExit { .. } => LogCode::PageExit,
            EventAction::Heartbeat => LogCode::Heartbeat,
            EventAction::LocationPing { .. } => LogCode::LocationPing,
            EventAction::PushResult { .. } => LogCode::PushResult,
        }
    }

    /// Only heartbeats are priority records.
    pub fn is_priority(&self) -> bool {
        matches!(self, EventAction::Heartbeat)
    }

    /// Encode into a validated record stamped with `at`.
    pub fn encode(self, at: DateTime<Utc>) -> Result<LogRecord, ValidationError> {
        let record = LogRecord::new(self.code(), at).with_priority(self.is_priority());

        let record = match self {
            EventAction::TagString { key, value } => {
                record.with_key(key).with_payload(Payload::String(value))
            }
            EventAction::TagNumeric { key, value } => {
                record.with_key(key).with_payload(Payload::Numeric(value))
            }
            EventAction::TagDatetime { key, value } => {
                record.with_key(key).with_payload(Payload::Datetime(value))
            }
            EventAction::RemoveTag { key } => record.with_key(key),
            EventAction::IncrementTag { key } => {
                record.with_key(key).with_payload(Payload::Numeric(1.0))
            }
            EventAction::PageEnter { page } | EventAction::PageExit { page } => {
                if page.trim().is_empty() {
                    return Err(ValidationError::EmptyPage);
                }
                record.with_attribute("page", page)
            }
            EventAction::Heartbeat => record,
            EventAction::LocationPing { location } => record
                .with_attribute("lat", location.latitude)
                .with_attribute("lng", location.longitude),
            EventAction::PushResult {
                msgid,
                code,
                result,
            } => record
                .with_attribute("msgid", msgid)
                .with_attribute("code", code)
                .with_attribute("result", result.label()),
        };

        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_numeric_encodes_as_8999() {
        let record = EventAction::TagNumeric {
            key: "fave_product".into(),
            value: 8.0,
        }
        .encode(Utc::now())
        .unwrap();

        assert_eq!(record.code.code(), 8999);
        assert_eq!(record.key.as_deref(), Some("fave_product"));
        assert_eq!(record.payload, Some(Payload::Numeric(8.0)));
        assert!(!record.priority);
    }

    #[test]
    fn remove_tag_encodes_as_8998_without_payload() {
        let record = EventAction::RemoveTag {
            key: "sh_email".into(),
        }
        .encode(Utc::now())
        .unwrap();

        assert_eq!(record.code.code(), 8998);
        assert_eq!(record.key.as_deref(), Some("sh_email"));
        assert_eq!(record.payload, None);
        assert_eq!(record.comment(), serde_json::json!({"key": "sh_email"}));
    }

    #[test]
    fn increment_tag_encodes_as_8997_with_one() {
        let record = EventAction::IncrementTag {
            key: "visits".into(),
        }
        .encode(Utc::now())
        .unwrap();

        assert_eq!(record.code.code(), 8997);
        assert_eq!(record.payload, Some(Payload::Numeric(1.0)));
        assert_eq!(
            record.comment(),
            serde_json::json!({"key": "visits", "numeric": 1.0})
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = EventAction::TagString {
            key: String::new(),
            value: "x".into(),
        }
        .encode(Utc::now())
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyKey);
    }

    #[test]
    fn non_finite_numeric_is_rejected() {
        let err = EventAction::TagNumeric {
            key: "score".into(),
            value: f64::NAN,
        }
        .encode(Utc::now())
        .unwrap_err();
        assert_eq!(err, ValidationError::NonFinite("score".into()));
    }

    #[test]
    fn heartbeat_is_priority() {
        let record = EventAction::Heartbeat.encode(Utc::now()).unwrap();
        assert_eq!(record.code, LogCode::Heartbeat);
        assert!(record.priority);
    }

    #[test]
    fn location_ping_carries_coordinates() {
        let record = EventAction::LocationPing {
            location: GeoPoint {
                latitude: -33.86,
                longitude: 151.2,
            },
        }
        .encode(Utc::now())
        .unwrap();

        assert_eq!(record.code.code(), 19);
        assert!(!record.priority);
        assert_eq!(record.comment()["lat"], -33.86);
    }

    #[test]
    fn empty_page_is_rejected() {
        let err = EventAction::PageEnter {
            page: String::new(),
        }
        .encode(Utc::now())
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyPage);
    }
}
