//! W3C WebDriver backend

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};
use tracing::{debug, info, warn};

use shopcheck_common::{BrowserConfig, HarnessConfig, Locator, Strategy};

use crate::driver::{Connect, Driver, DriverError, DriverResult, Element};
use crate::error::E2eResult;
use crate::service::{DriverService, ServiceConfig};

/// Arguments every Chrome session gets
const CHROME_ARGS: &[&str] = &["--disable-gpu", "--no-sandbox", "--log-level=3", "--silent"];

/// One WebDriver session
pub struct WebDriverSession {
    driver: WebDriver,
    closed: AtomicBool,
}

impl WebDriverSession {
    /// Open a Chrome session on the WebDriver server at `server_url`
    pub async fn connect(server_url: &str, browser: &BrowserConfig) -> E2eResult<Self> {
        let caps = chrome_capabilities(browser).map_err(map_error)?;
        debug!("Opening WebDriver session on {}", server_url);

        let driver = WebDriver::new(server_url, caps).await.map_err(map_error)?;
        if browser.implicit_wait_secs > 0 {
            driver
                .set_implicit_wait_timeout(browser.implicit_wait())
                .await
                .map_err(map_error)?;
        }

        Ok(Self {
            driver,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::SessionClosed);
        }
        Ok(())
    }
}

fn chrome_capabilities(browser: &BrowserConfig) -> WebDriverResult<ChromeCapabilities> {
    let mut caps = DesiredCapabilities::chrome();
    if browser.headless {
        caps.add_arg("--headless=new")?;
    }
    for arg in CHROME_ARGS {
        caps.add_arg(arg)?;
    }
    for arg in &browser.extra_args {
        caps.add_arg(arg)?;
    }
    Ok(caps)
}

fn by(locator: &Locator) -> By {
    let selector = locator.selector();
    match locator.strategy {
        Strategy::Id => By::Id(selector),
        Strategy::Css => By::Css(selector),
        Strategy::ClassName => By::ClassName(selector),
        Strategy::Name => By::Name(selector),
        Strategy::XPath => By::XPath(selector),
        Strategy::Tag => By::Tag(selector),
        Strategy::LinkText => By::LinkText(selector),
    }
}

fn map_error(e: WebDriverError) -> DriverError {
    classify(e.to_string())
}

fn classify(message: String) -> DriverError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("stale element") {
        DriverError::StaleElement(message)
    } else if lower.contains("invalid session id") {
        DriverError::SessionClosed
    } else {
        DriverError::Command(message)
    }
}

#[async_trait]
impl Driver for WebDriverSession {
    type Element = WebDriverElement;

    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.ensure_open()?;
        self.driver.goto(url).await.map_err(map_error)
    }

    async fn query(&self, locator: &Locator) -> DriverResult<Option<WebDriverElement>> {
        self.ensure_open()?;
        let elements = self.driver.find_all(by(locator)).await.map_err(map_error)?;
        Ok(elements
            .into_iter()
            .next()
            .map(|element| WebDriverElement { element }))
    }

    async fn screenshot_png(&self) -> DriverResult<Vec<u8>> {
        self.ensure_open()?;
        self.driver.screenshot_as_png().await.map_err(map_error)
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.ensure_open()?;
        let url = self.driver.current_url().await.map_err(map_error)?;
        Ok(url.to_string())
    }

    async fn quit(&self) -> DriverResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.driver.clone().quit().await.map_err(map_error)
    }
}

pub struct WebDriverElement {
    element: WebElement,
}

#[async_trait]
impl Element for WebDriverElement {
    async fn is_displayed(&self) -> DriverResult<bool> {
        self.element.is_displayed().await.map_err(map_error)
    }

    async fn click(&self) -> DriverResult<()> {
        self.element.click().await.map_err(map_error)
    }

    async fn clear(&self) -> DriverResult<()> {
        self.element.clear().await.map_err(map_error)
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        self.element.send_keys(text).await.map_err(map_error)
    }

    async fn text(&self) -> DriverResult<String> {
        self.element.text().await.map_err(map_error)
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        self.element.attr(name).await.map_err(map_error)
    }
}

/// Opens WebDriver sessions, spawning a local chromedriver if no server URL
/// is configured
pub struct WebDriverConnector {
    config: Arc<HarnessConfig>,
    server_url: String,
    service: Option<DriverService>,
}

impl WebDriverConnector {
    pub async fn start(config: Arc<HarnessConfig>) -> E2eResult<Self> {
        let (server_url, service) = match &config.browser.webdriver_url {
            Some(url) => {
                info!("Using WebDriver server at {}", url);
                (url.clone(), None)
            }
            None => {
                let service = DriverService::spawn(ServiceConfig::from_browser(&config.browser)).await?;
                (service.base_url().to_string(), Some(service))
            }
        };

        Ok(Self {
            config,
            server_url,
            service,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Stop the spawned driver service, if any
    pub fn shutdown(&mut self) -> E2eResult<()> {
        if let Some(mut service) = self.service.take() {
            service.stop()?;
        }
        Ok(())
    }
}

impl Drop for WebDriverConnector {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to stop driver service: {}", e);
        }
    }
}

#[async_trait]
impl Connect for WebDriverConnector {
    type Driver = WebDriverSession;

    async fn connect(&self) -> E2eResult<WebDriverSession> {
        WebDriverSession::connect(&self.server_url, &self.config.browser).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            classify("stale element reference: node is detached".to_string()),
            DriverError::StaleElement(_)
        ));
        assert_eq!(
            classify("The WebDriver server returned: invalid session id".to_string()),
            DriverError::SessionClosed
        );
        assert_eq!(
            classify("no such window".to_string()),
            DriverError::Command("no such window".to_string())
        );
    }
}
