//! Login page object

use std::sync::Arc;

use shopcheck_common::{HarnessConfig, Locator};

use crate::actions::Actions;
use crate::driver::Driver;
use crate::error::E2eResult;
use crate::report::step;

pub const USERNAME_INPUT: Locator = Locator::id("user-name");
pub const PASSWORD_INPUT: Locator = Locator::id("password");
pub const LOGIN_BUTTON: Locator = Locator::id("login-button");
pub const ERROR_MESSAGE: Locator = Locator::css("[data-test='error']");
pub const LOGO: Locator = Locator::class_name("login_logo");
/// Product list shown on the landing page
pub const INVENTORY_CONTAINER: Locator = Locator::id("inventory_container");

pub struct LoginPage<D: Driver> {
    actions: Actions<D>,
    config: Arc<HarnessConfig>,
}

impl<D: Driver> LoginPage<D> {
    pub fn new(actions: Actions<D>, config: Arc<HarnessConfig>) -> Self {
        Self { actions, config }
    }

    pub fn actions(&self) -> &Actions<D> {
        &self.actions
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub async fn open(&self) -> E2eResult<()> {
        step(self.actions.reporter(), "Open login page", async {
            self.actions.goto(&self.config.base_url).await
        })
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> E2eResult<()> {
        step(
            self.actions.reporter(),
            format!("Login with username={} and password={}", username, password),
            async {
                self.actions.type_text(&USERNAME_INPUT, username).await?;
                self.actions.type_text(&PASSWORD_INPUT, password).await?;
                self.actions.click(&LOGIN_BUTTON).await
            },
        )
        .await
    }

    /// Log in with the credentials configured for `user_type`.
    ///
    /// An unknown tag fails before any browser command is sent.
    pub async fn login_as(&self, user_type: &str) -> E2eResult<()> {
        let credentials = self.config.credentials(user_type)?;
        step(
            self.actions.reporter(),
            format!("Login as user {}", user_type),
            self.login(&credentials.username, &credentials.password),
        )
        .await
    }

    /// Click the login button without touching the fields
    pub async fn submit(&self) -> E2eResult<()> {
        self.actions.click(&LOGIN_BUTTON).await
    }

    pub async fn error_message(&self) -> E2eResult<String> {
        step(self.actions.reporter(), "Get error message text", async {
            self.actions.read_text(&ERROR_MESSAGE).await
        })
        .await
    }

    pub async fn is_logo_displayed(&self) -> E2eResult<bool> {
        self.actions.is_visible(&LOGO).await
    }

    pub async fn is_username_field_displayed(&self) -> E2eResult<bool> {
        self.actions.is_visible(&USERNAME_INPUT).await
    }

    pub async fn is_password_field_displayed(&self) -> E2eResult<bool> {
        self.actions.is_visible(&PASSWORD_INPUT).await
    }

    /// Exact comparison of the current URL against the landing URL
    pub async fn is_on_landing_page(&self) -> E2eResult<bool> {
        step(self.actions.reporter(), "Check if on landing page", async {
            Ok(self.actions.current_url().await? == self.config.landing_url)
        })
        .await
    }

    pub async fn current_url(&self) -> E2eResult<String> {
        self.actions.current_url().await
    }

    pub async fn username_placeholder(&self) -> E2eResult<String> {
        Ok(self
            .actions
            .read_attribute(&USERNAME_INPUT, "placeholder")
            .await?
            .unwrap_or_default())
    }

    pub async fn password_placeholder(&self) -> E2eResult<String> {
        Ok(self
            .actions
            .read_attribute(&PASSWORD_INPUT, "placeholder")
            .await?
            .unwrap_or_default())
    }

    pub async fn take_screenshot(&self, name: &str) -> E2eResult<()> {
        self.actions.capture_artifact(name).await
    }
}
