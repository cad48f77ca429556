//! hawk.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCATION_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
pub const DEFAULT_TICK: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_LAUNCH_COMMAND: &str = "launchvc";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HawkConfig {
    pub app: AppConfig,
    pub server: Option<ServerConfig>,
    pub transport: Option<TransportConfig>,
    pub scheduler: Option<SchedulerConfig>,
    pub deeplink: Option<DeepLinkConfig>,
    pub state: Option<StateConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_key: String,
    pub client_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// host:port of the backend.
    pub address: String,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub capacity: Option<usize>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub location_interval: Option<String>,
    pub heartbeat_interval: Option<String>,
    pub tick: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepLinkConfig {
    /// Expected URL scheme. Any scheme is accepted when unset.
    pub scheme: Option<String>,
    pub command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    pub path: Option<PathBuf>,
}

impl HawkConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HawkConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Minimal config carrying only the app key.
    pub fn new(app_key: &str) -> Self {
        HawkConfig {
            app: AppConfig {
                app_key: app_key.to_string(),
                client_version: None,
            },
            server: None,
            transport: None,
            scheduler: None,
            deeplink: None,
            state: None,
        }
    }

    /// Scaffold a hawk.toml with every section filled in.
    pub fn scaffold(app_key: &str, address: &str) -> Self {
        HawkConfig {
            app: AppConfig {
                app_key: app_key.to_string(),
                client_version: Some("1.0.0 (1)".to_string()),
            },
            server: Some(ServerConfig {
                address: address.to_string(),
                timeout: Some("10s".to_string()),
            }),
            transport: Some(TransportConfig {
                capacity: Some(DEFAULT_QUEUE_CAPACITY),
                batch_size: Some(DEFAULT_BATCH_SIZE),
            }),
            scheduler: Some(SchedulerConfig {
                location_interval: Some("1h".to_string()),
                heartbeat_interval: Some("6h".to_string()),
                tick: Some("5m".to_string()),
            }),
            deeplink: Some(DeepLinkConfig {
                scheme: None,
                command: Some(DEFAULT_LAUNCH_COMMAND.to_string()),
            }),
            state: None,
        }
    }

    pub fn server_timeout(&self) -> Duration {
        self.server
            .as_ref()
            .and_then(|s| s.timeout.as_deref())
            .and_then(parse_duration)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn queue_capacity(&self) -> usize {
        self.transport
            .as_ref()
            .and_then(|t| t.capacity)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn batch_size(&self) -> usize {
        self.transport
            .as_ref()
            .and_then(|t| t.batch_size)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn location_interval(&self) -> Duration {
        self.scheduler
            .as_ref()
            .and_then(|s| s.location_interval.as_deref())
            .and_then(parse_duration)
            .unwrap_or(DEFAULT_LOCATION_INTERVAL)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.scheduler
            .as_ref()
            .and_then(|s| s.heartbeat_interval.as_deref())
            .and_then(parse_duration)
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL)
    }

    pub fn tick(&self) -> Duration {
        self.scheduler
            .as_ref()
            .and_then(|s| s.tick.as_deref())
            .and_then(parse_duration)
            .unwrap_or(DEFAULT_TICK)
    }

    pub fn launch_command(&self) -> &str {
        self.deeplink
            .as_ref()
            .and_then(|d| d.command.as_deref())
            .unwrap_or(DEFAULT_LAUNCH_COMMAND)
    }

    pub fn url_scheme(&self) -> Option<&str> {
        self.deeplink.as_ref().and_then(|d| d.scheme.as_deref())
    }

    pub fn state_path(&self) -> Option<&Path> {
        self.state.as_ref().and_then(|s| s.path.as_deref())
    }
}

/// Parse a duration string like "500ms", "30s", "5m", "6h".
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>().ok().map(|h| Duration::from_secs(h * 3600))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold() {
        let config = HawkConfig::scaffold("SHSample", "127.0.0.1:8080");
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("SHSample"));
        assert!(toml_str.contains("launchvc"));
    }

    #[test]
    fn test_parse_minimal() {
        let toml_str = r#"
[app]
app_key = "SHSample"
"#;
        let config: HawkConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.app.app_key, "SHSample");
        assert_eq!(config.location_interval(), DEFAULT_LOCATION_INTERVAL);
        assert_eq!(config.heartbeat_interval(), DEFAULT_HEARTBEAT_INTERVAL);
        assert_eq!(config.launch_command(), "launchvc");
        assert_eq!(config.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_parse_overrides() {
        let toml_str = r#"
[app]
app_key = "SHSample"

[server]
address = "api.example.com:80"
timeout = "2s"

[scheduler]
location_interval = "30m"
heartbeat_interval = "12h"

[deeplink]
scheme = "hawkdemo"
"#;
        let config: HawkConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server_timeout(), Duration::from_secs(2));
        assert_eq!(config.location_interval(), Duration::from_secs(1800));
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(12 * 3600));
        assert_eq!(config.url_scheme(), Some("hawkdemo"));
    }

    #[test]
    fn parse_duration_values() {
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("6h"), Some(Duration::from_secs(21600)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("soon"), None);
    }
}
