//! In-memory storefront used by unit tests
//!
//! Emulates the login page closely enough to drive the page model: field
//! values, credential checks, error banners, the landing redirect and
//! delayed or hidden elements. Time is read from `tokio::time` so tests can
//! run on a paused clock.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use shopcheck_common::{HarnessConfig, Locator, Strategy};

use crate::driver::{Connect, Driver, DriverError, DriverResult, Element};
use crate::error::E2eResult;

/// Elements the fake page knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Username,
    Password,
    LoginButton,
    ErrorBanner,
    Logo,
    InventoryContainer,
}

impl Kind {
    fn from_locator(locator: &Locator) -> Option<Self> {
        match (locator.strategy, locator.selector()) {
            (Strategy::Id, "user-name") => Some(Kind::Username),
            (Strategy::Id, "password") => Some(Kind::Password),
            (Strategy::Id, "login-button") => Some(Kind::LoginButton),
            (Strategy::Css, "[data-test='error']") => Some(Kind::ErrorBanner),
            (Strategy::ClassName, "login_logo") => Some(Kind::Logo),
            (Strategy::Id, "inventory_container") => Some(Kind::InventoryContainer),
            _ => None,
        }
    }
}

const GLITCH_USER: &str = "performance_glitch_user";
const LOCKED_USER: &str = "locked_out_user";

#[derive(Debug)]
struct PageState {
    base_url: String,
    landing_url: String,
    accounts: HashMap<String, String>,
    glitch_delay: Duration,

    url: String,
    username: String,
    password: String,
    error: Option<String>,
    landing_ready_at: Option<Instant>,
    appear_at: HashMap<Kind, Instant>,
    hidden: HashSet<Kind>,

    fail_attributes: bool,
    fail_screenshots: bool,
    quit: bool,
}

impl PageState {
    fn on_login_page(&self) -> bool {
        self.url == self.base_url
    }

    fn present(&self, kind: Kind) -> bool {
        if let Some(at) = self.appear_at.get(&kind) {
            if Instant::now() < *at {
                return false;
            }
        }
        match kind {
            Kind::InventoryContainer => {
                self.url == self.landing_url
                    && self.landing_ready_at.map_or(true, |at| Instant::now() >= at)
            }
            Kind::ErrorBanner => self.on_login_page() && self.error.is_some(),
            _ => self.on_login_page(),
        }
    }

    fn submit(&mut self) {
        let error = if self.username.is_empty() {
            Some("Epic sadface: Username is required")
        } else if self.password.is_empty() {
            Some("Epic sadface: Password is required")
        } else {
            match self.accounts.get(&self.username) {
                Some(password) if *password == self.password => {
                    if self.username == LOCKED_USER {
                        Some("Epic sadface: Sorry, this user has been locked out.")
                    } else {
                        None
                    }
                }
                _ => Some(
                    "Epic sadface: Username and password do not match any user in this service",
                ),
            }
        };

        match error {
            Some(message) => self.error = Some(message.to_string()),
            None => {
                self.error = None;
                self.url = self.landing_url.clone();
                self.landing_ready_at = (self.username == GLITCH_USER)
                    .then(|| Instant::now() + self.glitch_delay);
            }
        }
    }
}

/// Fake driver session
#[derive(Debug, Clone)]
pub struct FakeDriver {
    state: Arc<Mutex<PageState>>,
    calls: Arc<AtomicUsize>,
    screenshots: Arc<AtomicUsize>,
}

impl FakeDriver {
    /// A fresh session that has not navigated anywhere
    pub fn new(config: &HarnessConfig) -> Self {
        let accounts = config
            .users
            .values()
            .map(|c| (c.username.clone(), c.password.clone()))
            .collect();
        Self {
            state: Arc::new(Mutex::new(PageState {
                base_url: config.base_url.clone(),
                landing_url: config.landing_url.clone(),
                accounts,
                glitch_delay: Duration::from_secs(5),
                url: "about:blank".to_string(),
                username: String::new(),
                password: String::new(),
                error: None,
                landing_ready_at: None,
                appear_at: HashMap::new(),
                hidden: HashSet::new(),
                fail_attributes: false,
                fail_screenshots: false,
                quit: false,
            })),
            calls: Arc::new(AtomicUsize::new(0)),
            screenshots: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A session already showing the login page
    pub fn on_login_page(config: &HarnessConfig) -> Self {
        let driver = Self::new(config);
        {
            let mut state = driver.state.lock();
            state.url = state.base_url.clone();
        }
        driver
    }

    /// Make `kind` absent until `delay` from now
    pub fn delay(&self, kind: Kind, delay: Duration) {
        self.state.lock().appear_at.insert(kind, Instant::now() + delay);
    }

    /// Keep `kind` in the DOM but not displayed
    pub fn hide(&self, kind: Kind) {
        self.state.lock().hidden.insert(kind);
    }

    pub fn set_glitch_delay(&self, delay: Duration) {
        self.state.lock().glitch_delay = delay;
    }

    pub fn fail_attribute_reads(&self) {
        self.state.lock().fail_attributes = true;
    }

    pub fn fail_screenshots(&self) {
        self.state.lock().fail_screenshots = true;
    }

    pub fn field_value(&self, kind: Kind) -> String {
        let state = self.state.lock();
        match kind {
            Kind::Username => state.username.clone(),
            Kind::Password => state.password.clone(),
            _ => String::new(),
        }
    }

    /// Number of driver and element commands issued
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn screenshots_taken(&self) -> usize {
        self.screenshots.load(Ordering::SeqCst)
    }

    pub fn is_quit(&self) -> bool {
        self.state.lock().quit
    }

    fn command(&self) -> DriverResult<parking_lot::MutexGuard<'_, PageState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        if state.quit {
            return Err(DriverError::SessionClosed);
        }
        Ok(state)
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> DriverResult<()> {
        let mut state = self.command()?;
        state.url = url.to_string();
        state.username.clear();
        state.password.clear();
        state.error = None;
        Ok(())
    }

    async fn query(&self, locator: &Locator) -> DriverResult<Option<FakeElement>> {
        let state = self.command()?;
        Ok(Kind::from_locator(locator)
            .filter(|kind| state.present(*kind))
            .map(|kind| FakeElement {
                kind,
                driver: self.clone(),
            }))
    }

    async fn screenshot_png(&self) -> DriverResult<Vec<u8>> {
        let state = self.command()?;
        if state.fail_screenshots {
            return Err(DriverError::Command("screenshot unavailable".to_string()));
        }
        self.screenshots.fetch_add(1, Ordering::SeqCst);
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend_from_slice(state.url.as_bytes());
        Ok(png)
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.command()?.url.clone())
    }

    async fn quit(&self) -> DriverResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().quit = true;
        Ok(())
    }
}

/// Element handle into the fake page
#[derive(Debug)]
pub struct FakeElement {
    kind: Kind,
    driver: FakeDriver,
}

#[async_trait]
impl Element for FakeElement {
    async fn is_displayed(&self) -> DriverResult<bool> {
        let state = self.driver.command()?;
        if !state.present(self.kind) {
            return Err(DriverError::StaleElement(format!("{:?}", self.kind)));
        }
        Ok(!state.hidden.contains(&self.kind))
    }

    async fn click(&self) -> DriverResult<()> {
        let mut state = self.driver.command()?;
        if self.kind == Kind::LoginButton {
            state.submit();
        }
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        let mut state = self.driver.command()?;
        match self.kind {
            Kind::Username => state.username.clear(),
            Kind::Password => state.password.clear(),
            _ => {}
        }
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        let mut state = self.driver.command()?;
        match self.kind {
            Kind::Username => state.username.push_str(text),
            Kind::Password => state.password.push_str(text),
            _ => {}
        }
        Ok(())
    }

    async fn text(&self) -> DriverResult<String> {
        let state = self.driver.command()?;
        Ok(match self.kind {
            Kind::ErrorBanner => state.error.clone().unwrap_or_default(),
            Kind::Logo => "Swag Labs".to_string(),
            Kind::LoginButton => "Login".to_string(),
            _ => String::new(),
        })
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        let state = self.driver.command()?;
        if state.fail_attributes {
            return Err(DriverError::Command("invalid session id".to_string()));
        }
        Ok(match (self.kind, name) {
            (Kind::Username, "placeholder") => Some("Username".to_string()),
            (Kind::Password, "placeholder") => Some("Password".to_string()),
            (Kind::Username, "value") => Some(state.username.clone()),
            (Kind::Password, "value") => Some(state.password.clone()),
            _ => None,
        })
    }
}

/// Hands out fresh fake sessions and remembers them
pub struct FakeConnector {
    config: HarnessConfig,
    sessions: Mutex<Vec<FakeDriver>>,
    fail_connect: bool,
}

impl FakeConnector {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(Vec::new()),
            fail_connect: false,
        }
    }

    pub fn failing(config: HarnessConfig) -> Self {
        Self {
            fail_connect: true,
            ..Self::new(config)
        }
    }

    pub fn sessions(&self) -> Vec<FakeDriver> {
        self.sessions.lock().clone()
    }
}

#[async_trait]
impl Connect for FakeConnector {
    type Driver = FakeDriver;

    async fn connect(&self) -> E2eResult<FakeDriver> {
        if self.fail_connect {
            return Err(DriverError::Command("session not created".to_string()).into());
        }
        let driver = FakeDriver::new(&self.config);
        self.sessions.lock().push(driver.clone());
        Ok(driver)
    }
}
