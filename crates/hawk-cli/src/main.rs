use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info,hawk=debug";

#[derive(Parser)]
#[command(
    name = "hawkctl",
    about = "Hawk: install lifecycle and event coordinator",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter hawk.toml
    Init {
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        app_key: String,
        /// Backend host:port
        #[arg(long, default_value = "127.0.0.1:8080")]
        server: String,
        /// Replace an existing hawk.toml
        #[arg(long)]
        force: bool,
    },
    /// Resolve a launch URL against a friendly-name file
    Resolve {
        url: String,
        /// JSON array of {friendly_name, vc, xib_iphone?, xib_ipad?}
        #[arg(short, long)]
        names: Option<PathBuf>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Send one tag to the configured backend
    Tag {
        #[command(flatten)]
        config: ConfigArg,
        key: String,
        #[command(flatten)]
        value: TagValue,
    },
    /// Run the regular tasks once
    RegularTask {
        #[command(flatten)]
        config: ConfigArg,
        /// Report this latitude as the current location
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
    },
    /// Send user feedback to the configured backend
    Feedback {
        #[command(flatten)]
        config: ConfigArg,
        #[arg(long, default_value = "")]
        title: String,
        content: String,
    },
    /// Route a notification payload (JSON object)
    Notify {
        #[command(flatten)]
        config: ConfigArg,
        payload: String,
        /// Interactive action identifier
        #[arg(long)]
        action: Option<String>,
        /// Treat the app as running in the foreground
        #[arg(long)]
        foreground: bool,
    },
}

#[derive(Args)]
struct ConfigArg {
    /// Path to hawk.toml
    #[arg(short, long, default_value = "hawk.toml")]
    config: PathBuf,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TagValue {
    #[arg(long)]
    string: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    numeric: Option<f64>,
    /// "YYYY-MM-DD HH:MM:SS", UTC
    #[arg(long)]
    datetime: Option<String>,
    #[arg(long)]
    remove: bool,
    #[arg(long)]
    increment: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            path,
            app_key,
            server,
            force,
        } => commands::init::init(&path, &app_key, &server, force),
        Commands::Resolve { url, names, format } => {
            let output = commands::resolve::resolve(&url, names.as_deref(), &format)?;
            println!("{output}");
            Ok(())
        }
        Commands::Tag { config, key, value } => {
            let action = commands::send::tag_action(
                key,
                value.string,
                value.numeric,
                value.datetime.as_deref(),
                value.remove,
                value.increment,
            )?;
            commands::send::tag(&config.config, action).await
        }
        Commands::RegularTask { config, lat, lng } => {
            commands::send::regular_task(&config.config, lat.zip(lng)).await
        }
        Commands::Feedback {
            config,
            title,
            content,
        } => commands::send::feedback(&config.config, title, content).await,
        Commands::Notify {
            config,
            payload,
            action,
            foreground,
        } => commands::send::notify(&config.config, &payload, action, foreground).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_filter_parses() {
        let filter = tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing::level_filters::LevelFilter::DEBUG)
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
