use std::time::Duration;

use admin_client::{PageSize, RefreshInterval};
use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/tradedesk.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub refresh_path: String,
    pub page_size: PageSize,
    pub refresh_interval: RefreshInterval,
    pub request_timeout_secs: u64,
    pub log_file: String,
    pub log_level: String,
    pub state_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            refresh_path: "/api/auth/refresh".to_string(),
            page_size: PageSize::TEN,
            refresh_interval: RefreshInterval::Off,
            request_timeout_secs: 15,
            log_file: "tradedesk_tui.log".to_string(),
            log_level: "info".to_string(),
            state_file: "config/tradedesk_state.json".to_string(),
        }
    }
}

impl AppConfig {
    /// `None` when the timeout is disabled with `0`.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[derive(Debug, Parser)]
#[command(name = "tradedesk_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the admin API base URL (e.g. http://localhost:8080).
    #[arg(long)]
    base_url: Option<String>,
    /// Override the default page size (10, 25, 50 or 100).
    #[arg(long)]
    page_size: Option<u32>,
    /// Override the default auto-refresh interval (off, 30s, 1m, 5m, 15m).
    #[arg(long)]
    refresh_interval: Option<RefreshInterval>,
    /// Override the log file path.
    #[arg(long)]
    log_file: Option<String>,
    /// Override the log level (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("TRADEDESK"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = PageSize::new(page_size)?;
    }
    if let Some(refresh_interval) = args.refresh_interval {
        settings.refresh_interval = refresh_interval;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let settings: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "base_url = \"http://admin.internal:9000\"\npage_size = 50\nrefresh_interval = \"5m\"",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.base_url, "http://admin.internal:9000");
        assert_eq!(settings.page_size, PageSize::FIFTY);
        assert_eq!(settings.refresh_interval, RefreshInterval::M5);
        assert_eq!(settings.log_file, "tradedesk_tui.log");
    }

    #[test]
    fn unsupported_page_size_is_rejected() {
        let result = config::Config::builder()
            .add_source(config::File::from_str("page_size = 20", config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn zero_timeout_disables_it() {
        let settings = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(settings.request_timeout(), None);
        assert_eq!(
            AppConfig::default().request_timeout(),
            Some(Duration::from_secs(15))
        );
    }
}
