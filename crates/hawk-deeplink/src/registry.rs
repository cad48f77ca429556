//! FriendlyNameRegistry: Friendly name → view descriptor.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use hawk_core::{FriendlyName, ValidationError};

/// Outcome of a successful registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: usize,
    /// Friendly names that replaced an earlier entry.
    pub overwritten: Vec<String>,
}

impl RegistrationReport {
    pub fn has_warnings(&self) -> bool {
        !self.overwritten.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FriendlyNameRegistry {
    entries: RwLock<HashMap<String, FriendlyName>>,
}

impl FriendlyNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of descriptors.
    ///
    /// The batch is validated first. If any entry lacks a friendly name or
    /// a view class, nothing is registered. Duplicates overwrite the prior
    /// entry and are listed in the report.
    pub fn register(
        &self,
        entries: impl IntoIterator<Item = FriendlyName>,
    ) -> Result<RegistrationReport, ValidationError> {
        let entries: Vec<FriendlyName> = entries.into_iter().collect();

        let mut errors: Vec<ValidationError> = entries.iter().filter_map(validate).collect();
        match errors.len() {
            0 => {}
            1 => return Err(errors.remove(0)),
            _ => return Err(ValidationError::InvalidEntries(errors)),
        }

        let mut report = RegistrationReport::default();
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for entry in entries {
            let name = entry.friendly_name.clone();
            if map.insert(name.clone(), entry).is_some() {
                warn!(friendly_name = %name, "friendly name registered twice, keeping the latest");
                report.overwritten.push(name);
            }
            report.registered += 1;
        }
        debug!(
            registered = report.registered,
            total = map.len(),
            "friendly names registered"
        );
        Ok(report)
    }

    pub fn lookup(&self, friendly_name: &str) -> Option<FriendlyName> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(friendly_name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate(entry: &FriendlyName) -> Option<ValidationError> {
    if entry.friendly_name.trim().is_empty() {
        return Some(ValidationError::EmptyFriendlyName);
    }
    if entry.view_class.trim().is_empty() {
        return Some(ValidationError::EmptyViewClass(entry.friendly_name.clone()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let registry = FriendlyNameRegistry::new();
        let report = registry
            .register([FriendlyName::new("login", "LoginView")])
            .unwrap();
        assert_eq!(report.registered, 1);
        assert!(!report.has_warnings());
        assert_eq!(registry.lookup("login").unwrap().view_class, "LoginView");
        assert!(registry.lookup("Login").is_none());
    }

    #[test]
    fn duplicate_overwrites_with_warning() {
        let registry = FriendlyNameRegistry::new();
        registry
            .register([FriendlyName::new("home", "HomeV1")])
            .unwrap();
        let report = registry
            .register([FriendlyName::new("home", "HomeV2")])
            .unwrap();

        assert_eq!(report.overwritten, vec!["home".to_string()]);
        assert_eq!(registry.lookup("home").unwrap().view_class, "HomeV2");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_entry_rejects_whole_batch() {
        let registry = FriendlyNameRegistry::new();
        let err = registry
            .register([
                FriendlyName::new("ok", "OkView"),
                FriendlyName::new("broken", " "),
            ])
            .unwrap_err();

        assert_eq!(err, ValidationError::EmptyViewClass("broken".into()));
        assert!(registry.is_empty());
    }

    #[test]
    fn several_invalid_entries_are_all_reported() {
        let registry = FriendlyNameRegistry::new();
        let err = registry
            .register([FriendlyName::new("", "View"), FriendlyName::new("x", "")])
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::InvalidEntries(vec![
                ValidationError::EmptyFriendlyName,
                ValidationError::EmptyViewClass("x".into()),
            ])
        );
    }
}
