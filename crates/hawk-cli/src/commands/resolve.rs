use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use hawk_core::{FriendlyName, LaunchRequest};
use hawk_deeplink::{DeepLinkResolver, FriendlyNameRegistry};

/// Resolve `url`, optionally against friendly names loaded from `names`.
pub fn resolve(url: &str, names: Option<&Path>, format: &str) -> anyhow::Result<String> {
    let registry = Arc::new(FriendlyNameRegistry::new());
    if let Some(path) = names {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let entries: Vec<FriendlyName> = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        let report = registry.register(entries)?;
        for name in &report.overwritten {
            eprintln!("warning: friendly name {name:?} defined more than once, using the last");
        }
    }

    let request = DeepLinkResolver::new(registry).resolve(url)?;
    match format {
        "json" => Ok(serde_json::to_string_pretty(&request)?),
        _ => Ok(format_request(&request)),
    }
}

fn format_request(request: &LaunchRequest) -> String {
    let mut out = format!("view class: {}", request.view_class);
    if let Some(phone) = &request.phone_resource {
        out.push_str(&format!("\nphone resource: {phone}"));
    }
    if let Some(tablet) = &request.tablet_resource {
        out.push_str(&format!("\ntablet resource: {tablet}"));
    }
    for (key, value) in &request.extras {
        out.push_str(&format!("\n  {key} = {value}"));
    }
    out
}
