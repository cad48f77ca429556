//! The device's install identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned install identifier.
pub type InstallId = String;

/// Where an install sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    /// No identity and no registration outstanding.
    Empty,
    /// First registration in flight.
    Pending,
    /// Server assigned an install id.
    Identified,
}

/// Local mirror of the backend's install record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Install {
    /// Empty until the first successful registration.
    pub install_id: InstallId,
    pub app_key: String,
    pub client_version: Option<String>,
    pub push_token: Option<String>,
    pub advertising_id: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    /// True while a create/update call is outstanding.
    #[serde(skip)]
    pub pending: bool,
}

impl Install {
    pub fn new(app_key: impl Into<String>) -> Self {
        Self {
            install_id: String::new(),
            app_key: app_key.into(),
            client_version: None,
            push_token: None,
            advertising_id: None,
            last_update: None,
            pending: false,
        }
    }

    pub fn is_identified(&self) -> bool {
        !self.install_id.is_empty()
    }

    pub fn phase(&self) -> InstallPhase {
        if self.is_identified() {
            InstallPhase::Identified
        } else if self.pending {
            InstallPhase::Pending
        } else {
            InstallPhase::Empty
        }
    }

    /// Copy of this install with `changes` applied. The app key never changes.
    pub fn with_changes(&self, changes: &InstallChanges) -> Install {
        let mut next = self.clone();
        if let Some(token) = &changes.push_token {
            next.push_token = Some(token.clone());
        }
        if let Some(id) = &changes.advertising_id {
            next.advertising_id = Some(id.clone());
        }
        if let Some(version) = &changes.client_version {
            next.client_version = Some(version.clone());
        }
        next
    }

    /// Request body describing this install.
    pub fn request(&self) -> InstallRequest {
        InstallRequest {
            app_key: self.app_key.clone(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            client_version: self.client_version.clone(),
            push_token: self.push_token.clone(),
            advertising_id: self.advertising_id.clone(),
        }
    }
}

/// Mutable install attributes. The app key is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallChanges {
    pub push_token: Option<String>,
    pub advertising_id: Option<String>,
    pub client_version: Option<String>,
}

impl InstallChanges {
    pub fn push_token(token: impl Into<String>) -> Self {
        Self {
            push_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn advertising_id(id: impl Into<String>) -> Self {
        Self {
            advertising_id: Some(id.into()),
            ..Default::default()
        }
    }

    /// These changes, with unset fields taken from `fallback`.
    pub fn or(self, fallback: &InstallChanges) -> InstallChanges {
        InstallChanges {
            push_token: self.push_token.or_else(|| fallback.push_token.clone()),
            advertising_id: self.advertising_id.or_else(|| fallback.advertising_id.clone()),
            client_version: self.client_version.or_else(|| fallback.client_version.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.push_token.is_none() && self.advertising_id.is_none() && self.client_version.is_none()
    }
}

/// Body of an install register/update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub app_key: String,
    pub sdk_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertising_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_install_is_empty() {
        let install = Install::new("SHSample");
        assert_eq!(install.phase(), InstallPhase::Empty);
        assert!(!install.is_identified());
    }

    #[test]
    fn phase_transitions() {
        let mut install = Install::new("SHSample");
        install.pending = true;
        assert_eq!(install.phase(), InstallPhase::Pending);

        install.install_id = "abc".into();
        install.pending = false;
        assert_eq!(install.phase(), InstallPhase::Identified);
    }

    #[test]
    fn changes_never_touch_app_key() {
        let install = Install::new("SHSample");
        let next = install.with_changes(&InstallChanges::push_token("tok"));
        assert_eq!(next.app_key, "SHSample");
        assert_eq!(next.push_token.as_deref(), Some("tok"));
    }

    #[test]
    fn explicit_changes_win_over_fallback() {
        let fallback = InstallChanges {
            client_version: Some("2.0".into()),
            push_token: Some("old".into()),
            ..Default::default()
        };
        let merged = InstallChanges::push_token("new").or(&fallback);
        assert_eq!(merged.push_token.as_deref(), Some("new"));
        assert_eq!(merged.client_version.as_deref(), Some("2.0"));
        assert_eq!(merged.advertising_id, None);
    }

    #[test]
    fn request_omits_unset_fields() {
        let json = serde_json::to_value(Install::new("k").request()).unwrap();
        assert_eq!(json["app_key"], "k");
        assert!(json.get("push_token").is_none());
    }
}
