//! User feedback sent straight to the backend.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A title/content pair, optionally tied to the notification that asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgid: Option<String>,
}

impl Feedback {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            msgid: None,
        }
    }

    pub fn with_msgid(mut self, msgid: impl Into<String>) -> Self {
        self.msgid = Some(msgid.into());
        self
    }

    /// Either the title or the content must say something.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() && self.content.trim().is_empty() {
            return Err(ValidationError::EmptyFeedback);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_feedback_is_rejected() {
        assert_eq!(
            Feedback::new(" ", "").validate(),
            Err(ValidationError::EmptyFeedback)
        );
        assert!(Feedback::new("", "Love the app").validate().is_ok());
        assert!(Feedback::new("Bug", "").validate().is_ok());
    }

    #[test]
    fn msgid_is_omitted_when_unset() {
        let json = serde_json::to_value(Feedback::new("Bug", "Crash on start")).unwrap();
        assert!(json.get("msgid").is_none());

        let json = serde_json::to_value(Feedback::new("Bug", "x").with_msgid("m-1")).unwrap();
        assert_eq!(json["msgid"], "m-1");
    }
}
