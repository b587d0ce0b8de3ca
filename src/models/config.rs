use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub wakeup: WakeUpConfig,
    pub session: SessionConfig,
    pub images: ImageConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Layers `config.toml` / `config.json` (both optional) and `BALLOT__SECTION__KEY`
    /// environment variables over the defaults. Runs before logging is up, so
    /// failures are returned for the caller to report.
    pub fn load() -> crate::error::Result<Self> {
        Ok(Self::from_sources("config")?)
    }

    pub fn from_sources(basename: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(basename).required(false))
            .add_source(
                config::Environment::with_prefix("BALLOT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: 30,
            user_agent: "BallotClient/2.0".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between background vote-count refreshes on the profile view.
    pub vote_refresh_interval: u64,
    /// Milliseconds between a successful vote and the move to the results view.
    pub results_redirect_delay_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            vote_refresh_interval: 10,
            results_redirect_delay_ms: 1500,
        }
    }
}

impl PollingConfig {
    pub fn vote_refresh_period(&self) -> Duration {
        Duration::from_secs(self.vote_refresh_interval.max(1))
    }

    pub fn results_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.results_redirect_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeUpConfig {
    pub countdown_secs: u64,
    pub probe_timeout_secs: u64,
    pub retry_delay_secs: u64,
}

impl Default for WakeUpConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 50,
            probe_timeout_secs: 5,
            retry_delay_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub token_file: String,
    pub storage_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: "data/session.json".to_string(),
            storage_key: "accessToken".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Hosts whose `/uploads/...` URLs are re-rooted on the API base. Empty disables the rewrite.
    pub legacy_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "ballot.log".to_string(),
        }
    }
}
