use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};
use tracing::debug;

/// Overrides `providers.bb.base_url` when set and non-empty.
pub const BB_URL_ENV: &str = "BB_URL";

const DEFAULT_BB_URL: &str = "https://be.buenbit.com/api/market/tickers/";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BbProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub bb: Option<BbProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            bb: Some(BbProviderConfig {
                base_url: DEFAULT_BB_URL.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Upper bound for a single upstream request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl AppConfig {
    /// Loads the config at the default location, falling back to defaults
    /// when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Self::default().with_env_overrides();
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "coinbani", "coinbani")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        config.with_env_overrides()
    }

    fn with_env_overrides(self) -> Result<Self> {
        self.with_bb_url_override(env::var(BB_URL_ENV).ok())
            .validated()
    }

    fn with_bb_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            debug!("Using BB url from {}", BB_URL_ENV);
            self.providers.bb = Some(BbProviderConfig { base_url: url });
        }
        self
    }

    fn validated(self) -> Result<Self> {
        ensure!(
            self.http.timeout_secs > 0,
            "http.timeout_secs must be greater than zero"
        );
        Ok(self)
    }

    pub fn bb_base_url(&self) -> &str {
        self.providers
            .bb
            .as_ref()
            .map_or(DEFAULT_BB_URL, |p| &p.base_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
