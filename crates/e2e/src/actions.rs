//! Explicit-wait element lookup and the actions built on it
//!
//! Every action goes through [`Actions::lookup`], which polls until the
//! locator matches a visible element or the budget runs out. A timed-out
//! lookup attaches one `"screenshot"` artifact and reports
//! [`Lookup::TimedOut`]; each action then decides whether that becomes an
//! error (`click`, `type_text`, `read_text`) or a default value
//! (`is_visible`, `read_attribute`).

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use shopcheck_common::{HarnessConfig, Locator};

use crate::driver::{Driver, DriverError, DriverResult, Element};
use crate::error::{E2eError, E2eResult};
use crate::report::{step, Attachment, Reporter};

/// Tag of the artifact captured when a lookup times out
pub const LOOKUP_SCREENSHOT: &str = "screenshot";

/// Outcome of the lookup primitive
#[derive(Debug)]
pub enum Lookup<E> {
    Found(E),
    TimedOut { locator: Locator, timeout: Duration },
}

impl<E> Lookup<E> {
    /// Turn a timeout into [`E2eError::LookupTimeout`]
    pub fn into_result(self) -> E2eResult<E> {
        match self {
            Lookup::Found(element) => Ok(element),
            Lookup::TimedOut { locator, timeout } => {
                Err(E2eError::LookupTimeout { locator, timeout })
            }
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Wait/action wrapper over one driver session
pub struct Actions<D: Driver> {
    driver: Arc<D>,
    reporter: Arc<dyn Reporter>,
    default_timeout: Duration,
    poll_interval: Duration,
}

impl<D: Driver> Clone for Actions<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            reporter: Arc::clone(&self.reporter),
            default_timeout: self.default_timeout,
            poll_interval: self.poll_interval,
        }
    }
}

impl<D: Driver> Actions<D> {
    pub fn new(driver: Arc<D>, reporter: Arc<dyn Reporter>, config: &HarnessConfig) -> Self {
        Self {
            driver,
            reporter,
            default_timeout: config.default_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Poll for a visible match; capture a screenshot artifact on timeout.
    pub async fn lookup(&self, locator: &Locator, timeout: Duration) -> E2eResult<Lookup<D::Element>> {
        if let Some(element) = self.poll_visible(locator, timeout).await? {
            return Ok(Lookup::Found(element));
        }

        if let Err(e) = self.attach_screenshot(LOOKUP_SCREENSHOT).await {
            warn!(%locator, "failed to capture lookup screenshot: {}", e);
        }

        Ok(Lookup::TimedOut {
            locator: locator.clone(),
            timeout,
        })
    }

    /// Find a visible element within the default timeout
    pub async fn find(&self, locator: &Locator) -> E2eResult<D::Element> {
        self.find_with_timeout(locator, self.default_timeout).await
    }

    /// Find a visible element within `timeout`
    pub async fn find_with_timeout(&self, locator: &Locator, timeout: Duration) -> E2eResult<D::Element> {
        step(
            self.reporter(),
            format!("Find element {}", locator),
            async { self.lookup(locator, timeout).await?.into_result() },
        )
        .await
    }

    /// Wait for a visible element without capturing an artifact
    pub async fn wait_for(&self, locator: &Locator, timeout: Duration) -> E2eResult<D::Element> {
        step(self.reporter(), format!("Wait for element {}", locator), async {
            self.poll_visible(locator, timeout)
                .await?
                .ok_or_else(|| E2eError::LookupTimeout {
                    locator: locator.clone(),
                    timeout,
                })
        })
        .await
    }

    pub async fn click(&self, locator: &Locator) -> E2eResult<()> {
        step(self.reporter(), format!("Click element {}", locator), async {
            let element = self.lookup(locator, self.default_timeout).await?.into_result()?;
            element.click().await?;
            Ok(())
        })
        .await
    }

    /// Clear the field, then type `text`. An empty string leaves it empty.
    pub async fn type_text(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        step(
            self.reporter(),
            format!("Enter text '{}' into element {}", text, locator),
            async {
                let element = self.lookup(locator, self.default_timeout).await?.into_result()?;
                element.clear().await?;
                element.send_keys(text).await?;
                Ok(())
            },
        )
        .await
    }

    pub async fn read_text(&self, locator: &Locator) -> E2eResult<String> {
        step(self.reporter(), format!("Get text from element {}", locator), async {
            let element = self.lookup(locator, self.default_timeout).await?.into_result()?;
            Ok(element.text().await?)
        })
        .await
    }

    /// Existence check: a timeout yields `false` instead of an error
    pub async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        step(
            self.reporter(),
            format!("Check if element {} is displayed", locator),
            async {
                match self.lookup(locator, self.default_timeout).await? {
                    Lookup::Found(element) => Ok(element.is_displayed().await?),
                    Lookup::TimedOut { .. } => Ok(false),
                }
            },
        )
        .await
    }

    /// Attribute value; `None` when unset or when the element never shows up.
    /// Other driver failures propagate.
    pub async fn read_attribute(&self, locator: &Locator, name: &str) -> E2eResult<Option<String>> {
        step(
            self.reporter(),
            format!("Get attribute '{}' of element {}", name, locator),
            async {
                match self.lookup(locator, self.default_timeout).await? {
                    Lookup::Found(element) => Ok(element.attribute(name).await?),
                    Lookup::TimedOut { .. } => Ok(None),
                }
            },
        )
        .await
    }

    pub async fn current_url(&self) -> E2eResult<String> {
        step(self.reporter(), "Get current URL", async {
            Ok(self.driver.current_url().await?)
        })
        .await
    }

    pub async fn goto(&self, url: &str) -> E2eResult<()> {
        step(self.reporter(), format!("Open {}", url), async {
            Ok(self.driver.goto(url).await?)
        })
        .await
    }

    /// Attach a screenshot named `name`, whatever the page state
    pub async fn capture_artifact(&self, name: &str) -> E2eResult<()> {
        step(self.reporter(), "Take screenshot", self.attach_screenshot(name)).await
    }

    async fn attach_screenshot(&self, name: &str) -> E2eResult<()> {
        let png = self.driver.screenshot_png().await?;
        self.reporter.attach(Attachment::png(name, png));
        Ok(())
    }

    async fn poll_visible(&self, locator: &Locator, timeout: Duration) -> E2eResult<Option<D::Element>> {
        let start = Instant::now();
        // None when the budget is too large to represent: poll until found
        let deadline = start.checked_add(timeout);
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            match self.visible_match(locator).await {
                Ok(Some(element)) => {
                    debug!(%locator, attempts, elapsed_ms = start.elapsed().as_millis() as u64, "element visible");
                    return Ok(Some(element));
                }
                Ok(None) => {}
                // The node was replaced between query and visibility check
                Err(DriverError::StaleElement(_)) => {}
                Err(e) => return Err(e.into()),
            }

            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    debug!(%locator, attempts, "element not visible before deadline");
                    return Ok(None);
                }
                Some(deadline) => self.poll_interval.min(deadline - now),
                None => self.poll_interval,
            };
            sleep(pause).await;
        }
    }

    async fn visible_match(&self, locator: &Locator) -> DriverResult<Option<D::Element>> {
        match self.driver.query(locator).await? {
            Some(element) if element.is_displayed().await? => Ok(Some(element)),
            _ => Ok(None),
        }
    }
}
