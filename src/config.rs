//! Layered configuration: built-in defaults, optional `agar.toml`, then
//! `AGAR__*` environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "agar";

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error(transparent)]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub browser: BrowserConfig,
    pub processing: ProcessingConfig,
    pub poller: PollerConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    pub page_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    pub batch_size: usize,
    pub embeddings_limit: usize,
    pub results_log_cap: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadConfig {
    pub expiration_secs: u64,
}

pub fn load() -> Result<AppConfig, AppConfigError> {
    let builder = Config::builder()
        .set_default("api.base_url", "http://127.0.0.1:3500")?
        .set_default("browser.page_size", 20_i64)?
        .set_default("processing.batch_size", 10_i64)?
        .set_default("processing.embeddings_limit", 100_i64)?
        .set_default("processing.results_log_cap", 100_i64)?
        .set_default("poller.interval_ms", 2000_i64)?
        .set_default("download.expiration_secs", 3600_i64)?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix("AGAR").separator("__"));

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}

impl AppConfig {
    fn validate(&self) -> Result<(), AppConfigError> {
        if self.browser.page_size == 0 {
            return Err(AppConfigError::Invalid("browser.page_size must be > 0".into()));
        }
        if self.processing.batch_size == 0 {
            return Err(AppConfigError::Invalid(
                "processing.batch_size must be > 0".into(),
            ));
        }
        if self.poller.interval_ms == 0 {
            return Err(AppConfigError::Invalid("poller.interval_ms must be > 0".into()));
        }
        Ok(())
    }
}
