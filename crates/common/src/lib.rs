//! ShopCheck Common Library
//!
//! Locators, credentials and the harness configuration shared by the
//! browser runner and its test binary.

pub mod config;
pub mod error;
pub mod types;

pub use config::{BrowserConfig, HarnessConfig, TestData, WaitProfiles};
pub use error::{Error, Result};
pub use types::*;

/// ShopCheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
