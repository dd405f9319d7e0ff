//! Error types for the browser runner

use std::time::Duration;
use thiserror::Error;

use shopcheck_common::Locator;

use crate::driver::DriverError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Element not visible within {}s: {locator}", timeout.as_secs_f64())]
    LookupTimeout { locator: Locator, timeout: Duration },

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Scenario panicked: {0}")]
    ScenarioPanicked(String),

    #[error("Driver service failed to start: {0}")]
    ServiceStartup(String),

    #[error("Driver service health check failed after {0} attempts")]
    ServiceHealthCheck(usize),

    #[error(transparent)]
    Config(#[from] shopcheck_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Whether this is an unknown user-type lookup failure
    pub fn is_unknown_user_type(&self) -> bool {
        matches!(
            self,
            E2eError::Config(shopcheck_common::Error::UnknownUserType { .. })
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Fail the current scenario with [`E2eError::AssertionFailed`] unless the
/// condition holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::E2eError::AssertionFailed(format!($($arg)+)));
        }
    };
}
