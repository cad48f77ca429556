//! Deep-link targets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Platform-agnostic alias for a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendlyName {
    pub friendly_name: String,
    #[serde(alias = "vc")]
    pub view_class: String,
    #[serde(default, alias = "xib_iphone")]
    pub phone_resource: Option<String>,
    #[serde(default, alias = "xib_ipad")]
    pub tablet_resource: Option<String>,
}

impl FriendlyName {
    pub fn new(friendly_name: impl Into<String>, view_class: impl Into<String>) -> Self {
        Self {
            friendly_name: friendly_name.into(),
            view_class: view_class.into(),
            phone_resource: None,
            tablet_resource: None,
        }
    }
}

/// A concrete request to present a view, handed to the presenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub view_class: String,
    pub phone_resource: Option<String>,
    pub tablet_resource: Option<String>,
    /// Query parameters passed through unmodified.
    pub extras: BTreeMap<String, String>,
}

impl LaunchRequest {
    pub fn new(view_class: impl Into<String>) -> Self {
        Self {
            view_class: view_class.into(),
            ..Default::default()
        }
    }
}
