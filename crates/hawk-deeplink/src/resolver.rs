//! DeepLinkResolver: Launch URL → `LaunchRequest`.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use hawk_core::config::DEFAULT_LAUNCH_COMMAND;
use hawk_core::{HawkConfig, LaunchRequest};

use crate::error::ResolveError;
use crate::registry::FriendlyNameRegistry;

const VIEW_CLASS_PARAM: &str = "vc";
const PHONE_RESOURCE_PARAM: &str = "xib_iphone";
const TABLET_RESOURCE_PARAM: &str = "xib_ipad";

pub struct DeepLinkResolver {
    registry: Arc<FriendlyNameRegistry>,
    command: String,
    scheme: Option<String>,
}

impl DeepLinkResolver {
    /// Resolver for the `launchvc` command, accepting any scheme.
    pub fn new(registry: Arc<FriendlyNameRegistry>) -> Self {
        Self {
            registry,
            command: DEFAULT_LAUNCH_COMMAND.to_string(),
            scheme: None,
        }
    }

    pub fn from_config(registry: Arc<FriendlyNameRegistry>, config: &HawkConfig) -> Self {
        let resolver = Self::new(registry).with_command(config.launch_command());
        match config.url_scheme() {
            Some(scheme) => resolver.with_scheme(scheme),
            None => resolver,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Only accept URLs with this scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn registry(&self) -> &Arc<FriendlyNameRegistry> {
        &self.registry
    }

    /// Whether `raw` parses and carries the launch command.
    pub fn is_launch_command(&self, raw: &str) -> bool {
        Url::parse(raw)
            .ok()
            .and_then(|url| command_of(&url))
            .is_some_and(|c| c.eq_ignore_ascii_case(&self.command))
    }

    /// Resolve a launch URL.
    ///
    /// `vc` is looked up in the registry first and otherwise taken as a
    /// literal view class. `xib_iphone`/`xib_ipad` in the URL override the
    /// registered resources. Every other query parameter becomes an extra.
    pub fn resolve(&self, raw: &str) -> Result<LaunchRequest, ResolveError> {
        let url = Url::parse(raw).map_err(|e| ResolveError::Malformed(e.to_string()))?;

        if let Some(expected) = &self.scheme
            && !url.scheme().eq_ignore_ascii_case(expected)
        {
            return Err(ResolveError::SchemeMismatch {
                expected: expected.clone(),
                found: url.scheme().to_string(),
            });
        }

        let command = command_of(&url).unwrap_or_default();
        if !command.eq_ignore_ascii_case(&self.command) {
            return Err(ResolveError::CommandMismatch(command));
        }

        let mut view: Option<String> = None;
        let mut phone = None;
        let mut tablet = None;
        let mut request = LaunchRequest::default();
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                VIEW_CLASS_PARAM => {
                    if view.is_none() {
                        view = Some(value.into_owned());
                    }
                }
                PHONE_RESOURCE_PARAM => phone = Some(value.into_owned()),
                TABLET_RESOURCE_PARAM => tablet = Some(value.into_owned()),
                _ => {
                    request.extras.insert(name.into_owned(), value.into_owned());
                }
            }
        }

        let view = view.ok_or(ResolveError::MissingViewClass)?;

        let target = self.launch_for(&view)?;
        request.view_class = target.view_class;
        request.phone_resource = target.phone_resource;
        request.tablet_resource = target.tablet_resource;
        if phone.is_some() {
            request.phone_resource = phone;
        }
        if tablet.is_some() {
            request.tablet_resource = tablet;
        }

        Ok(request)
    }

    /// Launch request for a friendly name, or for a literal view class when
    /// no friendly name matches.
    pub fn launch_for(&self, view: &str) -> Result<LaunchRequest, ResolveError> {
        let view = view.trim();
        if view.is_empty() {
            return Err(ResolveError::MissingViewClass);
        }
        match self.registry.lookup(view) {
            Some(entry) => {
                debug!(friendly_name = %view, view_class = %entry.view_class, "friendly name resolved");
                Ok(LaunchRequest {
                    view_class: entry.view_class,
                    phone_resource: entry.phone_resource,
                    tablet_resource: entry.tablet_resource,
                    ..Default::default()
                })
            }
            None => {
                debug!(view_class = %view, "no friendly name, using literal view class");
                Ok(LaunchRequest::new(view))
            }
        }
    }
}

/// Host of `scheme://command?..`, or the first path segment of `scheme:command?..`.
fn command_of(url: &Url) -> Option<String> {
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(host.to_string()),
        _ => url
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}
