//! Browser driver seam
//!
//! The runner talks to the browser only through these traits. The WebDriver
//! backend lives in [`crate::webdriver`]; unit tests use an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

use shopcheck_common::Locator;

use crate::error::E2eResult;

/// Failure reported by the browser driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("command failed: {0}")]
    Command(String),

    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("session closed")]
    SessionClosed,
}

pub type DriverResult<T> = Result<T, DriverError>;

/// A handle to one DOM element
#[async_trait]
pub trait Element: Send + Sync {
    async fn is_displayed(&self) -> DriverResult<bool>;

    async fn click(&self) -> DriverResult<()>;

    async fn clear(&self) -> DriverResult<()>;

    async fn send_keys(&self, text: &str) -> DriverResult<()>;

    /// Rendered text of the element
    async fn text(&self) -> DriverResult<String>;

    /// Attribute value, `None` when unset
    async fn attribute(&self, name: &str) -> DriverResult<Option<String>>;
}

/// One browser session
#[async_trait]
pub trait Driver: Send + Sync {
    type Element: Element;

    async fn goto(&self, url: &str) -> DriverResult<()>;

    /// First element matching the locator, without waiting
    async fn query(&self, locator: &Locator) -> DriverResult<Option<Self::Element>>;

    /// Full-page screenshot as PNG bytes
    async fn screenshot_png(&self) -> DriverResult<Vec<u8>>;

    async fn current_url(&self) -> DriverResult<String>;

    /// End the session. Further calls fail with [`DriverError::SessionClosed`].
    async fn quit(&self) -> DriverResult<()>;
}

/// Acquires a fresh browser session per scenario
#[async_trait]
pub trait Connect: Send + Sync {
    type Driver: Driver + 'static;

    async fn connect(&self) -> E2eResult<Self::Driver>;
}
