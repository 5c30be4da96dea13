use crate::constants::WESTIE_APP_URL;
use crate::error::{CrawlError, Result};
use crate::retry::RetryPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub browser: BrowserConfig,
    pub crawl: CrawlSettings,
    pub output: OutputConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub url: String,
    /// Account used for the email step of the login flow.
    pub email: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: WESTIE_APP_URL.to_string(),
            email: String::new(),
        }
    }
}

/// Browser the WebDriver session is opened with. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserProfile {
    Chrome,
    #[default]
    Edge,
    Firefox,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub profile: BrowserProfile,
    pub webdriver_url: String,
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            profile: BrowserProfile::default(),
            webdriver_url: "http://localhost:4444".to_string(),
            headless: false,
            user_data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Vertical scroll applied to the list container after each pass, in pixels.
    pub scroll_step: i64,
    pub max_section_retries: u32,
    pub max_lookup_retries: u32,
    pub section_probe_ms: u64,
    pub element_ms: u64,
    pub authentication_ms: u64,
    pub poll_ms: u64,
    pub scroll_settle_ms: u64,
    pub unknown_backoff_ms: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            scroll_step: 300,
            max_section_retries: 10,
            max_lookup_retries: 3,
            section_probe_ms: 1_000,
            element_ms: 20_000,
            authentication_ms: 60_000,
            poll_ms: 100,
            scroll_settle_ms: 500,
            unknown_backoff_ms: 500,
        }
    }
}

impl CrawlSettings {
    /// Short wait used to recognise the current screen.
    pub fn section_probe(&self) -> Duration {
        Duration::from_millis(self.section_probe_ms)
    }

    /// Standard wait for an element to show up.
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    /// Deadline for the human to type the PIN.
    pub fn authentication_timeout(&self) -> Duration {
        Duration::from_millis(self.authentication_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    /// Policy for viewport and last-tile lookups.
    pub fn lookup_policy(&self) -> RetryPolicy {
        RetryPolicy::immediate(self.max_lookup_retries)
    }

    /// Policy for re-identifying an unknown screen.
    pub fn section_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_section_retries,
            Duration::from_millis(self.unknown_backoff_ms),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub cookies_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            cookies_file: PathBuf::from("cookies.json"),
        }
    }
}

impl OutputConfig {
    pub fn images_dir(&self) -> PathBuf {
        self.dir.join("images")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Port of the Prometheus exporter; disabled when unset.
    pub port: Option<u16>,
}

impl Config {
    /// Load `path` (or `config.toml` when present), then apply `.env` and
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                Config::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CrawlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override file values with `WESTIE_*` variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = lookup("WESTIE_EMAIL") {
            self.site.email = email;
        }
        if let Some(url) = lookup("WESTIE_URL") {
            self.site.url = url;
        }
        if let Some(url) = lookup("WESTIE_WEBDRIVER_URL") {
            self.browser.webdriver_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.site.email.trim().is_empty() {
            return Err(CrawlError::Config(
                "site.email is required (or set WESTIE_EMAIL)".to_string(),
            ));
        }
        url::Url::parse(&self.site.url)
            .map_err(|e| CrawlError::Config(format!("site.url is invalid: {e}")))?;
        if self.crawl.scroll_step <= 0 {
            return Err(CrawlError::Config(
                "crawl.scroll_step must be positive".to_string(),
            ));
        }
        if self.crawl.max_lookup_retries == 0 {
            return Err(CrawlError::Config(
                "crawl.max_lookup_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
