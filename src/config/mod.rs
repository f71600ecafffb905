//! Configuration management for KaleWatch
//!
//! Loads from optional config files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub acquisition: AcquisitionConfig,
    pub history: HistoryConfig,
    pub preferences: PreferencesConfig,
    pub logging: LoggingConfig,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        Self::load_with(Self::environment())
    }

    /// `KALEWATCH_<SECTION>__<KEY>`, e.g. `KALEWATCH_HISTORY__CAPACITY=100`
    fn environment() -> Environment {
        Environment::with_prefix("KALEWATCH")
            .prefix_separator("_")
            .separator("__")
    }

    fn load_with(env: Environment) -> Result<Self> {
        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables
            .add_source(env);

        let app_config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Built-in defaults only, no files or environment
    pub fn defaults() -> Result<Self> {
        Self::with_defaults(Config::builder())?
            .build()
            .context("Failed to build default configuration")?
            .try_deserialize()
            .context("Failed to deserialize default configuration")
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            // Feed defaults
            .set_default("feed.kind", "simulated")?
            .set_default("feed.base_price", 0.095)?
            .set_default("feed.half_spread", 0.005)?
            .set_default("feed.floor_price", 0.08)?
            .set_default("feed.latency_ms", 500)?
            .set_default("feed.failure_rate", 0.0)?
            .set_default("feed.request_timeout_ms", 8000)?
            // Acquisition defaults
            .set_default("acquisition.poll_interval_secs", 10)?
            .set_default("acquisition.fetch_timeout_ms", 8000)?
            // History defaults
            .set_default("history.capacity", 50)?
            // Preferences defaults
            .set_default("preferences.path", "./data/preferences.json")?
            // Logging defaults
            .set_default("logging.json", false)?
            .set_default("logging.summary_interval_secs", 30)?
            // Dashboard defaults
            .set_default("dashboard.enabled", false)?
            .set_default("dashboard.port", 3001)?)
    }

    /// Reject settings the acquisition core cannot run with
    pub fn validate(&self) -> Result<()> {
        let feed = &self.feed;
        if !(feed.base_price.is_finite() && feed.base_price > 0.0) {
            bail!("feed.base_price must be a positive number");
        }
        if !(feed.floor_price.is_finite() && feed.floor_price > 0.0) {
            bail!("feed.floor_price must be a positive number");
        }
        if !(feed.half_spread.is_finite() && feed.half_spread >= 0.0) {
            bail!("feed.half_spread must be zero or positive");
        }
        if !(0.0..=1.0).contains(&feed.failure_rate) {
            bail!("feed.failure_rate must be between 0.0 and 1.0");
        }
        if feed.kind == FeedKind::Http && feed.url.as_deref().map_or(true, str::is_empty) {
            bail!("feed.url is required when feed.kind = http");
        }
        if self.acquisition.poll_interval_secs == 0 {
            bail!("acquisition.poll_interval_secs must be at least 1");
        }
        if self.acquisition.fetch_timeout_ms == 0 {
            bail!("acquisition.fetch_timeout_ms must be at least 1");
        }
        if self.history.capacity == 0 {
            bail!("history.capacity must be at least 1");
        }
        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "feed={} poll={}s timeout={}ms capacity={} dashboard={}",
            self.feed.kind,
            self.acquisition.poll_interval_secs,
            self.acquisition.fetch_timeout().as_millis(),
            self.history.capacity,
            self.dashboard.enabled
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
