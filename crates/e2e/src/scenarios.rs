//! Login scenario catalogue
//!
//! Each scenario is a fixed input/action/assertion sequence over a
//! [`LoginPage`] that has already been opened. Scenarios fail by returning an
//! error; assertions use [`crate::ensure!`].

use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::driver::Driver;
use crate::ensure;
use crate::error::{E2eError, E2eResult};
use crate::pages::login::{LoginPage, INVENTORY_CONTAINER};
use crate::report::step;

/// Selection tag attached to scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Smoke,
    Regression,
    Login,
}

impl FromStr for Marker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smoke" => Ok(Marker::Smoke),
            "regression" => Ok(Marker::Regression),
            "login" => Ok(Marker::Login),
            other => Err(format!(
                "unknown marker '{}': expected smoke, regression or login",
                other
            )),
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Marker::Smoke => write!(f, "smoke"),
            Marker::Regression => write!(f, "regression"),
            Marker::Login => write!(f, "login"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Normal,
}

pub type ScenarioFuture<'a> = BoxFuture<'a, E2eResult<()>>;

type ScenarioFn<D> = dyn for<'a> Fn(&'a LoginPage<D>) -> ScenarioFuture<'a> + Send + Sync;

/// A named, tagged scenario body
pub struct Scenario<D: Driver> {
    pub name: String,
    pub title: String,
    pub severity: Severity,
    pub markers: Vec<Marker>,
    body: Arc<ScenarioFn<D>>,
}

impl<D: Driver> Clone for Scenario<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            title: self.title.clone(),
            severity: self.severity,
            markers: self.markers.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<D: Driver> Scenario<D> {
    pub fn new<F>(
        name: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        markers: &[Marker],
        body: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a LoginPage<D>) -> ScenarioFuture<'a> + Send + Sync + 'static,
    {
        let mut markers = markers.to_vec();
        // everything in this catalogue exercises the login page
        if !markers.contains(&Marker::Login) {
            markers.push(Marker::Login);
        }
        Self {
            name: name.into(),
            title: title.into(),
            severity,
            markers,
            body: Arc::new(body),
        }
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    pub fn run<'a>(&self, page: &'a LoginPage<D>) -> ScenarioFuture<'a> {
        (self.body)(page)
    }
}

/// The full login catalogue
pub fn catalogue<D: Driver + 'static>() -> Vec<Scenario<D>> {
    let mut scenarios = vec![
        Scenario::new(
            "successful_login",
            "Successful login with valid credentials",
            Severity::Critical,
            &[Marker::Login, Marker::Smoke],
            |page| Box::pin(successful_login(page)),
        ),
        Scenario::new(
            "invalid_password_login",
            "Login with a wrong password",
            Severity::Normal,
            &[Marker::Login, Marker::Regression],
            |page| Box::pin(invalid_password_login(page)),
        ),
        Scenario::new(
            "locked_out_user_login",
            "Login as a locked-out user",
            Severity::Normal,
            &[Marker::Login, Marker::Regression],
            |page| Box::pin(locked_out_user_login(page)),
        ),
        Scenario::new(
            "empty_fields_login",
            "Login with empty credentials",
            Severity::Normal,
            &[Marker::Login, Marker::Regression],
            |page| Box::pin(empty_fields_login(page)),
        ),
        Scenario::new(
            "performance_glitch_user_login",
            "Login as performance_glitch_user",
            Severity::Normal,
            &[Marker::Login, Marker::Regression],
            |page| Box::pin(performance_glitch_user_login(page)),
        ),
    ];

    for (user_type, expect_success) in [("standard", true), ("locked", false), ("performance", true)] {
        scenarios.push(Scenario::new(
            format!("login_with_user_types[{}]", user_type),
            format!("Login as configured user type '{}'", user_type),
            Severity::Normal,
            &[Marker::Login],
            move |page| Box::pin(login_with_user_type(page, user_type, expect_success)),
        ));
    }

    scenarios
}

/// Scenarios carrying `marker` (all when `None`) and, if given, named `name`
pub fn select<D: Driver>(
    scenarios: Vec<Scenario<D>>,
    marker: Option<Marker>,
    name: Option<&str>,
) -> Vec<Scenario<D>> {
    scenarios
        .into_iter()
        .filter(|s| marker.map_or(true, |m| s.has_marker(m)))
        .filter(|s| name.map_or(true, |n| s.name == n))
        .collect()
}

pub async fn successful_login<D: Driver>(page: &LoginPage<D>) -> E2eResult<()> {
    let reporter = page.actions().reporter();
    let standard = page.config().credentials("standard")?.clone();

    step(reporter, "Log in with valid credentials", async {
        page.login(&standard.username, &standard.password).await
    })
    .await?;

    step(reporter, "Check redirect to the landing page", async {
        ensure!(
            page.is_on_landing_page().await?,
            "did not reach the landing page"
        );
        Ok(())
    })
    .await?;

    step(reporter, "Check the landing URL", async {
        let current = page.current_url().await?;
        let expected = &page.config().landing_url;
        ensure!(
            &current == expected,
            "unexpected URL after login: {} (expected {})",
            current,
            expected
        );
        Ok(())
    })
    .await
}

pub async fn invalid_password_login<D: Driver>(page: &LoginPage<D>) -> E2eResult<()> {
    let reporter = page.actions().reporter();
    let standard = page.config().credentials("standard")?.clone();
    let wrong = page.config().test_data.invalid_password.clone();

    step(reporter, "Log in with a wrong password", async {
        page.login(&standard.username, &wrong).await
    })
    .await?;

    step(reporter, "Check the error message", async {
        let error = page.error_message().await?;
        ensure!(
            error.contains("Username and password do not match"),
            "unexpected error message: {}",
            error
        );
        Ok(())
    })
    .await?;

    step(reporter, "Check we stayed on the login page", async {
        ensure!(
            !page.is_on_landing_page().await?,
            "reached the landing page with a wrong password"
        );
        Ok(())
    })
    .await
}

pub async fn locked_out_user_login<D: Driver>(page: &LoginPage<D>) -> E2eResult<()> {
    let reporter = page.actions().reporter();
    let locked = page.config().credentials("locked")?.clone();

    step(reporter, "Log in as the locked-out user", async {
        page.login(&locked.username, &locked.password).await
    })
    .await?;

    step(reporter, "Check the lock-out message", async {
        let error = page.error_message().await?;
        ensure!(
            error.contains("Sorry, this user has been locked out"),
            "unexpected lock-out message: {}",
            error
        );
        Ok(())
    })
    .await
}

pub async fn empty_fields_login<D: Driver>(page: &LoginPage<D>) -> E2eResult<()> {
    let reporter = page.actions().reporter();

    step(reporter, "Click login without entering anything", page.submit()).await?;

    step(reporter, "Check the error message", async {
        let error = page.error_message().await?;
        ensure!(
            error.contains("Username is required"),
            "unexpected empty-fields message: {}",
            error
        );
        Ok(())
    })
    .await
}

pub async fn performance_glitch_user_login<D: Driver>(page: &LoginPage<D>) -> E2eResult<()> {
    let reporter = page.actions().reporter();
    let glitch = page.config().credentials("performance")?.clone();
    let budget = page.config().timeout("ajax");

    step(reporter, "Log in as the slow user", async {
        page.login(&glitch.username, &glitch.password).await
    })
    .await?;

    step(reporter, "Wait for the landing page", async {
        match page.actions().wait_for(&INVENTORY_CONTAINER, budget).await {
            Ok(_) => {}
            Err(E2eError::LookupTimeout { .. }) => {
                page.take_screenshot("performance_glitch_timeout").await?;
                return Err(E2eError::AssertionFailed(format!(
                    "landing page did not load within {} seconds",
                    budget.as_secs()
                )));
            }
            Err(e) => return Err(e),
        }
        ensure!(
            page.is_on_landing_page().await?,
            "performance_glitch_user did not reach the landing page"
        );
        Ok(())
    })
    .await?;

    step(reporter, "Check landing page content", async {
        let url = page.current_url().await?;
        ensure!(url.contains("inventory"), "URL does not contain 'inventory': {}", url);
        ensure!(
            page.actions().is_visible(&INVENTORY_CONTAINER).await?,
            "inventory container is not displayed"
        );
        Ok(())
    })
    .await
}

pub async fn login_with_user_type<D: Driver>(
    page: &LoginPage<D>,
    user_type: &str,
    expect_success: bool,
) -> E2eResult<()> {
    let reporter = page.actions().reporter();

    step(reporter, format!("Log in as {}", user_type), page.login_as(user_type)).await?;

    if expect_success {
        step(reporter, "Check successful login", async {
            ensure!(
                page.is_on_landing_page().await?,
                "could not log in as {}",
                user_type
            );
            Ok(())
        })
        .await
    } else {
        step(reporter, "Check the error message", async {
            let error = page.error_message().await?;
            ensure!(!error.is_empty(), "expected an error for {}, got none", user_type);
            Ok(())
        })
        .await
    }
}
