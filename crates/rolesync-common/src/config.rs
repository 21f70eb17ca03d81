//! ---
//! rsd_section: "01-core-functionality"
//! rsd_subsection: "module"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Configuration loading and validation for the daemon."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_token_env_var() -> String {
    "DISCORD_TOKEN".to_owned()
}

fn default_sweep_enabled() -> bool {
    true
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(600)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_metrics_enabled() -> bool {
    false
}

fn default_metrics_listen() -> SocketAddr {
    "0.0.0.0:9898"
        .parse()
        .expect("valid default metrics address")
}

/// Primary configuration object for the RoleSync daemon.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    pub marker: MarkerConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "ROLESYNC_CONFIG";

    /// Load configuration from disk, respecting the `ROLESYNC_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.marker.validate()?;
        self.sweep.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Platform access settings. The credential itself never lives in the file;
/// only the name of the environment variable that carries it does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "default_token_env_var")]
    pub token_env: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env_var(),
        }
    }
}

impl DiscordConfig {
    /// Resolve the access credential from the configured environment variable.
    ///
    /// A missing or empty credential is a startup fault: the caller must not
    /// attempt to connect and should abort the process.
    pub fn resolve_token(&self) -> Result<String> {
        match std::env::var(&self.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            Ok(_) => Err(anyhow!(
                "environment variable {} is set but empty",
                self.token_env
            )),
            Err(_) => Err(anyhow!(
                "environment variable {} not set; export the bot token before starting",
                self.token_env
            )),
        }
    }
}

/// Marker role and vanity pattern, fixed for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MarkerConfig {
    pub role_id: u64,
    pub vanity_pattern: String,
}

impl MarkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.role_id == 0 {
            return Err(anyhow!("marker.role_id must be a non-zero role identifier"));
        }
        if self.vanity_pattern.is_empty() {
            return Err(anyhow!("marker.vanity_pattern must not be empty"));
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweep_enabled(),
            interval: default_sweep_interval(),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.interval.is_zero() {
            return Err(anyhow!("sweep.interval must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_listen")]
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            listen: default_metrics_listen(),
        }
    }
}
