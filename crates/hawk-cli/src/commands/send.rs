//! Commands that talk to the configured backend.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::NaiveDateTime;
use tracing::info;

use hawk_core::record::DATETIME_FORMAT;
use hawk_sdk::{
    AppState, EventAction, FixedLocation, HawkApp, HawkConfig, NoLocation, NotificationContext,
};

fn start(config: &Path, location: Option<(f64, f64)>) -> anyhow::Result<HawkApp> {
    let config = HawkConfig::from_file(config)
        .with_context(|| format!("loading {}", config.display()))?;
    let mut builder = HawkApp::builder(config);
    if let Some((lat, lng)) = location {
        builder = builder.location(Arc::new(FixedLocation::at(lat, lng)));
    } else {
        builder = builder.location(Arc::new(NoLocation));
    }
    Ok(builder.start()?)
}

/// Build the tag action selected on the command line.
pub fn tag_action(
    key: String,
    string: Option<String>,
    numeric: Option<f64>,
    datetime: Option<&str>,
    remove: bool,
    increment: bool,
) -> anyhow::Result<EventAction> {
    let action = match (string, numeric, datetime) {
        (Some(value), None, None) => EventAction::TagString { key, value },
        (None, Some(value), None) => EventAction::TagNumeric { key, value },
        (None, None, Some(raw)) => {
            let value = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .with_context(|| format!("datetime must look like {DATETIME_FORMAT}"))?
                .and_utc();
            EventAction::TagDatetime { key, value }
        }
        (None, None, None) if remove => EventAction::RemoveTag { key },
        (None, None, None) if increment => EventAction::IncrementTag { key },
        _ => bail!("choose exactly one of --string, --numeric, --datetime, --remove, --increment"),
    };
    Ok(action)
}

pub async fn tag(config: &Path, action: EventAction) -> anyhow::Result<()> {
    let app = start(config, None)?;
    let code = action.code();
    let result = app.send(action).await;
    app.shutdown().await;
    result?;
    println!("✓ Delivered {code} for install {}", app.install_id().unwrap_or_default());
    Ok(())
}

pub async fn regular_task(config: &Path, location: Option<(f64, f64)>) -> anyhow::Result<()> {
    let app = start(config, location)?;
    let result = app.regular_task(None);
    app.shutdown().await;
    let stats = app.queue_stats();
    info!(delivered = stats.delivered, failed = stats.failed, "regular tasks flushed");
    println!("{result:?} (delivered {}, failed {})", stats.delivered, stats.failed);
    Ok(())
}

pub async fn feedback(config: &Path, title: String, content: String) -> anyhow::Result<()> {
    let app = start(config, None)?;
    let result = app.send_feedback(title, content).await;
    app.shutdown().await;
    result?;
    println!("✓ Feedback sent for install {}", app.install_id().unwrap_or_default());
    Ok(())
}

pub async fn notify(
    config: &Path,
    payload: &str,
    action: Option<String>,
    foreground: bool,
) -> anyhow::Result<()> {
    let payload: serde_json::Value = serde_json::from_str(payload).context("payload is not JSON")?;
    let app = start(config, None)?;

    let mut ctx = NotificationContext::from_json(payload);
    if let Some(action) = action {
        ctx = ctx.with_action(action);
    }
    if foreground {
        ctx = ctx.with_app_state(AppState::Active);
    }
    let outcome = app.handle_notification(ctx).await;
    app.shutdown().await;
    println!("{outcome:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_value_flags_map_to_actions() {
        assert_eq!(
            tag_action("visits".into(), None, None, None, false, true).unwrap(),
            EventAction::IncrementTag {
                key: "visits".into()
            }
        );
        assert!(matches!(
            tag_action("when".into(), None, None, Some("2012-12-12 11:11:11"), false, false)
                .unwrap(),
            EventAction::TagDatetime { .. }
        ));
        assert!(tag_action("when".into(), None, None, Some("yesterday"), false, false).is_err());
        assert!(tag_action("k".into(), None, None, None, false, false).is_err());
    }
}
