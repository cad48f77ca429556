//! Inbound notification context.

use serde_json::{Map, Value};

use hawk_core::CompletionToken;

/// Whether the app was in the foreground when the notification arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Running and visible. UI codes ask for confirmation first.
    Active,
    /// Opened from the notification. UI codes act directly.
    #[default]
    Background,
}

/// One inbound notification awaiting routing.
///
/// The completion, when present, is consumed by the router on every path.
#[derive(Debug, Default)]
pub struct NotificationContext {
    pub payload: Map<String, Value>,
    pub action_id: Option<String>,
    pub app_state: AppState,
    pub completion: Option<CompletionToken>,
}

impl NotificationContext {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self {
            payload,
            ..Default::default()
        }
    }

    /// Build from a JSON object. Non-object values give an empty payload.
    pub fn from_json(payload: Value) -> Self {
        match payload {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }

    pub fn with_action(mut self, action_id: impl Into<String>) -> Self {
        self.action_id = Some(action_id.into());
        self
    }

    pub fn with_app_state(mut self, state: AppState) -> Self {
        self.app_state = state;
        self
    }

    pub fn with_completion(mut self, completion: CompletionToken) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn needs_completion(&self) -> bool {
        self.completion.is_some()
    }

    /// The `msgid` field as a string, numeric ids included.
    pub fn message_id(&self) -> Option<String> {
        match self.payload.get("msgid")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.payload
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
