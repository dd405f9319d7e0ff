//! Core types for ShopCheck

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Element lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Id,
    Css,
    ClassName,
    Name,
    XPath,
    Tag,
    LinkText,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Id => write!(f, "id"),
            Strategy::Css => write!(f, "css"),
            Strategy::ClassName => write!(f, "class"),
            Strategy::Name => write!(f, "name"),
            Strategy::XPath => write!(f, "xpath"),
            Strategy::Tag => write!(f, "tag"),
            Strategy::LinkText => write!(f, "link"),
        }
    }
}

/// A (strategy, selector) pair identifying zero or more DOM elements.
///
/// Lookups use first-match semantics; nothing enforces that a locator is
/// unique on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub strategy: Strategy,
    pub selector: Cow<'static, str>,
}

impl Locator {
    pub fn new(strategy: Strategy, selector: impl Into<Cow<'static, str>>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
        }
    }

    pub const fn id(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Id,
            selector: Cow::Borrowed(selector),
        }
    }

    pub const fn css(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            selector: Cow::Borrowed(selector),
        }
    }

    pub const fn class_name(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::ClassName,
            selector: Cow::Borrowed(selector),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.strategy, self.selector)
    }
}

/// Username/password pair for one user type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}
