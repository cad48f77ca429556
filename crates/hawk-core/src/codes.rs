//! Numeric log codes understood by the backend.

use serde::{Deserialize, Serialize};

/// Semantic type of a coded log record.
///
/// The wire representation is the bare integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum LogCode {
    /// Current device location (19).
    LocationPing,
    /// Periodic liveness signal (8051).
    Heartbeat,
    /// A page became visible (8108).
    PageEnter,
    /// A page was left (8109).
    PageExit,
    /// User response to a push notification (8202).
    PushResult,
    /// Increment a numeric user tag (8997).
    TagIncrement,
    /// Remove a user tag (8998).
    TagRemove,
    /// Set a user tag (8999).
    TagSet,
}

impl LogCode {
    pub const fn code(self) -> u32 {
        match self {
            LogCode::LocationPing => 19,
            LogCode::Heartbeat => 8051,
            LogCode::PageEnter => 8108,
            LogCode::PageExit => 8109,
            LogCode::PushResult => 8202,
            LogCode::TagIncrement => 8997,
            LogCode::TagRemove => 8998,
            LogCode::TagSet => 8999,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            19 => Some(LogCode::LocationPing),
            8051 => Some(LogCode::Heartbeat),
            8108 => Some(LogCode::PageEnter),
            8109 => Some(LogCode::PageExit),
            8202 => Some(LogCode::PushResult),
            8997 => Some(LogCode::TagIncrement),
            8998 => Some(LogCode::TagRemove),
            8999 => Some(LogCode::TagSet),
            _ => None,
        }
    }

    /// Tag codes carry a mandatory key.
    pub fn is_tag_family(self) -> bool {
        matches!(
            self,
            LogCode::TagIncrement | LogCode::TagRemove | LogCode::TagSet
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            LogCode::LocationPing => "location",
            LogCode::Heartbeat => "heartbeat",
            LogCode::PageEnter => "page_enter",
            LogCode::PageExit => "page_exit",
            LogCode::PushResult => "push_result",
            LogCode::TagIncrement => "tag_increment",
            LogCode::TagRemove => "tag_remove",
            LogCode::TagSet => "tag_set",
        }
    }
}

impl From<LogCode> for u32 {
    fn from(code: LogCode) -> Self {
        code.code()
    }
}

impl TryFrom<u32> for LogCode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        LogCode::from_code(value).ok_or_else(|| format!("unknown log code {value}"))
    }
}

impl std::fmt::Display for LogCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
