use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/budget.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timezone: String,
    pub output_dir: PathBuf,
    pub settle_ms: u64,
    pub level: String,
    pub use_server_dashboard: bool,
    /// Local budget snapshot used instead of the API.
    pub budget_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            token: None,
            timezone: "Europe/Paris".to_string(),
            output_dir: PathBuf::from("."),
            settle_ms: 1000,
            level: "info".to_string(),
            use_server_dashboard: false,
            budget_file: None,
        }
    }
}

impl AppConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| AppError::InvalidInput(format!("unknown timezone: {}", self.timezone)))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the budget dashboard.
    Show,
    /// Export the dashboard as `budget-tableau-de-bord.pdf`.
    Export,
    /// Send the local budget file to the API (create, or update with --id).
    Push {
        #[arg(long)]
        id: Option<i64>,
    },
    /// Delete a budget on the API.
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Debug, Parser)]
#[command(name = "liryna_budget", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:3000).
    #[arg(long)]
    base_url: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override the export directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Override the chart settle delay, in milliseconds.
    #[arg(long)]
    settle_ms: Option<u64>,
    /// Read the budget from a local JSON file (form data shape).
    #[arg(long)]
    budget_file: Option<PathBuf>,
    /// Use the dashboard aggregated by the API instead of computing it.
    #[arg(long)]
    server_dashboard: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

/// Loads the configuration: TOML file, then `LIRYNA_BUDGET_*` variables, then
/// command line overrides. The bearer token is never read from the CLI.
pub fn load() -> Result<(AppConfig, Command)> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("LIRYNA_BUDGET"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }
    if let Some(settle_ms) = args.settle_ms {
        settings.settle_ms = settle_ms;
    }
    if let Some(budget_file) = args.budget_file {
        settings.budget_file = Some(budget_file);
    }
    if args.server_dashboard {
        settings.use_server_dashboard = true;
    }

    Ok((settings, args.command.unwrap_or(Command::Show)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.settle(), Duration::from_millis(1000));
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Paris);
        assert!(!config.use_server_dashboard);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let config = AppConfig {
            timezone: "Mars/Olympus".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.timezone(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn toml_layer_overrides_defaults() {
        let settings: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "base_url = \"https://api.example.test\"\nsettle_ms = 10\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.base_url, "https://api.example.test");
        assert_eq!(settings.settle_ms, 10);
        assert_eq!(settings.timezone, "Europe/Paris");
    }

    #[test]
    fn cli_parses_subcommands() {
        let args = Args::parse_from(["liryna_budget", "--settle-ms", "5", "push", "--id", "3"]);
        assert_eq!(args.settle_ms, Some(5));
        assert_eq!(args.command, Some(Command::Push { id: Some(3) }));
    }
}
