use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;

const ENV_PREFIX: &str = "CRM_";

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the backend, e.g. `http://localhost:8000`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Where the bearer token is kept between runs
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Log output; the terminal itself belongs to the UI
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("crm_desk"))
        .unwrap_or_else(|| PathBuf::from(".crm_desk"))
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_session_file() -> PathBuf {
    data_dir().join("token")
}

fn default_log_file() -> PathBuf {
    data_dir().join("crm_desk.log")
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Command-line overrides for the environment configuration
#[derive(Debug, Default, Parser)]
#[command(name = "crm_desk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal client for managing customers and projects")]
pub struct Cli {
    /// Backend base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Session token file
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Screen to open first, as a path such as `/customers` or
    /// `/projects/update/3`
    #[arg(long)]
    pub route: Option<String>,

    /// Forget the stored session before starting
    #[arg(long)]
    pub logout: bool,
}

impl Config {
    /// Load configuration from `CRM_`-prefixed environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX).from_env::<Config>()?;

        Ok(config)
    }

    /// Flags given on the command line win over the environment
    pub fn apply(mut self, cli: &Cli) -> Self {
        if let Some(api_url) = &cli.api_url {
            self.api_url = api_url.clone();
        }
        if let Some(session_file) = &cli.session_file {
            self.session_file = session_file.clone();
        }
        if let Some(log_file) = &cli.log_file {
            self.log_file = log_file.clone();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Initialize environment variables and load configuration
pub fn init(cli: &Cli) -> Result<Config> {
    let config = Config::load()?.apply(cli);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()));
        envy::prefixed(ENV_PREFIX).from_iter(vars).unwrap()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = from_pairs(&[]);
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.session_file.ends_with("token"));
    }

    #[test]
    fn prefixed_variables_are_read() {
        let config = from_pairs(&[
            ("CRM_API_URL", "https://crm.example.com"),
            ("CRM_REQUEST_TIMEOUT_SECS", "5"),
            ("CRM_SESSION_FILE", "/tmp/crm-token"),
        ]);
        assert_eq!(config.api_url, "https://crm.example.com");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.session_file, PathBuf::from("/tmp/crm-token"));
    }

    #[test]
    fn cli_flags_override_environment() {
        let config = from_pairs(&[("CRM_API_URL", "https://crm.example.com")]);
        let cli = Cli::parse_from(["crm_desk", "--api-url", "http://127.0.0.1:9000", "--log-file", "/tmp/crm.log"]);
        let config = config.apply(&cli);

        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.log_file, PathBuf::from("/tmp/crm.log"));
    }

    #[test]
    fn start_route_flag_is_optional() {
        let cli = Cli::parse_from(["crm_desk", "--route", "/customers/update/3", "--logout"]);
        assert_eq!(cli.route.as_deref(), Some("/customers/update/3"));
        assert!(cli.logout);
        assert_eq!(Cli::parse_from(["crm_desk"]).route, None);
    }
}
