//! Harness configuration
//!
//! One immutable value built at startup and handed to the page model and the
//! action wrapper. Defaults describe the public storefront demo; a TOML file
//! and `SHOPCHECK_*` environment variables can override them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Credentials;

/// Environment variable overriding [`HarnessConfig::base_url`]
pub const ENV_BASE_URL: &str = "SHOPCHECK_BASE_URL";
/// Environment variable overriding [`BrowserConfig::webdriver_url`]
pub const ENV_WEBDRIVER_URL: &str = "SHOPCHECK_WEBDRIVER_URL";
/// Environment variable overriding [`BrowserConfig::headless`]
pub const ENV_HEADLESS: &str = "SHOPCHECK_HEADLESS";
/// Environment variable overriding [`HarnessConfig::output_dir`]
pub const ENV_OUTPUT_DIR: &str = "SHOPCHECK_OUTPUT_DIR";

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// URL of the login page
    pub base_url: String,

    /// URL a successful login redirects to
    pub landing_url: String,

    /// Environment label recorded in results
    pub environment: String,

    /// Element lookup timeout used when the caller gives none
    pub default_timeout_secs: u64,

    /// Interval between visibility polls
    pub poll_interval_ms: u64,

    /// Named wait-timeout profiles
    pub wait_timeouts: WaitProfiles,

    /// Credentials keyed by user-type tag
    pub users: BTreeMap<String, Credentials>,

    /// Inputs used by the negative scenarios
    pub test_data: TestData,

    /// Browser/session settings
    pub browser: BrowserConfig,

    /// Attach a screenshot when a scenario fails
    pub screenshot_on_failure: bool,

    /// Default tracing filter
    pub log_level: String,

    /// Where results and attachments are written
    pub output_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.saucedemo.com/".to_string(),
            landing_url: "https://www.saucedemo.com/inventory.html".to_string(),
            environment: "test".to_string(),
            default_timeout_secs: 10,
            poll_interval_ms: 500,
            wait_timeouts: WaitProfiles::default(),
            users: default_users(),
            test_data: TestData::default(),
            browser: BrowserConfig::default(),
            screenshot_on_failure: true,
            log_level: "info".to_string(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

fn default_users() -> BTreeMap<String, Credentials> {
    [
        ("standard", "standard_user"),
        ("locked", "locked_out_user"),
        ("performance", "performance_glitch_user"),
        ("problem", "problem_user"),
    ]
    .into_iter()
    .map(|(tag, username)| (tag.to_string(), Credentials::new(username, "secret_sauce")))
    .collect()
}

/// Wait-timeout profiles, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitProfiles {
    pub element: u64,
    pub page: u64,
    pub ajax: u64,
}

impl Default for WaitProfiles {
    fn default() -> Self {
        Self {
            element: 10,
            page: 30,
            ajax: 15,
        }
    }
}

impl WaitProfiles {
    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Option<u64> {
        match name {
            "element" => Some(self.element),
            "page" => Some(self.page),
            "ajax" => Some(self.ajax),
            _ => None,
        }
    }
}

/// Inputs for negative scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestData {
    pub invalid_password: String,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            invalid_password: "wrong_password".to_string(),
        }
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Existing WebDriver endpoint; when unset a local chromedriver is spawned
    pub webdriver_url: Option<String>,

    /// chromedriver binary used when spawning a local service
    pub chromedriver_path: PathBuf,

    /// Port for the spawned service (None = pick a free port)
    pub chromedriver_port: Option<u16>,

    /// Run the browser without a window
    pub headless: bool,

    /// Extra browser command-line arguments
    pub extra_args: Vec<String>,

    /// Session-level implicit wait applied on connect (0 = leave unset)
    pub implicit_wait_secs: u64,

    /// How long to wait for the spawned service to report ready
    pub service_startup_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            chromedriver_path: PathBuf::from("chromedriver"),
            chromedriver_port: None,
            headless: true,
            extra_args: Vec::new(),
            implicit_wait_secs: 0,
            service_startup_timeout_secs: 30,
        }
    }
}

impl BrowserConfig {
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_secs)
    }

    pub fn service_startup_timeout(&self) -> Duration {
        Duration::from_secs(self.service_startup_timeout_secs)
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `SHOPCHECK_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(url) = lookup(ENV_WEBDRIVER_URL) {
            self.browser.webdriver_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(value) = lookup(ENV_HEADLESS) {
            self.browser.headless = !matches!(value.as_str(), "0" | "false" | "no");
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    /// Reject values the harness cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.default_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "default_timeout_secs must be greater than zero".to_string(),
            ));
        }
        for (name, secs) in [
            ("element", self.wait_timeouts.element),
            ("page", self.wait_timeouts.page),
            ("ajax", self.wait_timeouts.ajax),
        ] {
            if secs == 0 {
                return Err(Error::InvalidConfig(format!(
                    "wait_timeouts.{} must be greater than zero",
                    name
                )));
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.landing_url.is_empty() {
            return Err(Error::InvalidConfig("landing_url is empty".to_string()));
        }
        if self.users.is_empty() {
            return Err(Error::InvalidConfig("no users configured".to_string()));
        }
        Ok(())
    }

    /// Credentials for a user-type tag
    pub fn credentials(&self, user_type: &str) -> Result<&Credentials> {
        self.users.get(user_type).ok_or_else(|| Error::UnknownUserType {
            tag: user_type.to_string(),
            available: self.users.keys().cloned().collect(),
        })
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Timeout for a named wait profile, or the default timeout
    pub fn timeout(&self, profile: &str) -> Duration {
        self.wait_timeouts
            .get(profile)
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.default_timeout())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
