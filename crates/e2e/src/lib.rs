//! ShopCheck browser runner
//!
//! Page-object test suite for the storefront login flow:
//! - a wait/action wrapper that polls for visible elements and captures a
//!   screenshot when a lookup times out
//! - a login page object built on that wrapper
//! - a catalogue of login scenarios, run one browser session each
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ScenarioRunner (one session each)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario ─► LoginPage ─► Actions ─► Driver (WebDriver)     │
//! │                              │                              │
//! │                              └─► Reporter (steps, PNGs)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Connect: WebDriverConnector ─► DriverService (chromedriver)│
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod actions;
pub mod driver;
pub mod error;
pub mod pages;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod service;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

pub use actions::{Actions, Lookup};
pub use driver::{Connect, Driver, DriverError, Element};
pub use error::{E2eError, E2eResult};
pub use pages::LoginPage;
pub use runner::{ScenarioRunner, SuiteResult};
pub use scenarios::{Marker, Scenario};
