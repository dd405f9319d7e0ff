//! Command line of the login suite binary

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser};

use shopcheck_common::HarnessConfig;
use shopcheck_e2e::Marker;

#[derive(Parser, Debug)]
#[command(name = "shopcheck-login")]
#[command(version = shopcheck_common::VERSION)]
#[command(about = "Login scenarios for the storefront")]
pub struct Args {
    /// Harness configuration file
    #[arg(short, long, env = "SHOPCHECK_CONFIG", default_value = "shopcheck.toml")]
    pub config: PathBuf,

    /// Run only scenarios carrying this marker (smoke, regression, login)
    #[arg(short, long)]
    pub tag: Option<Marker>,

    /// Run only the scenario with this name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Use an already running WebDriver server instead of spawning chromedriver
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Run the browser headless
    #[arg(long)]
    pub headless: Option<bool>,

    /// Output directory for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List the selected scenarios and exit
    #[arg(long)]
    pub list: bool,

    /// Run even when SHOPCHECK_E2E is unset
    #[arg(long)]
    pub run: bool,

    #[command(flatten)]
    pub libtest: LibtestArgs,
}

impl Args {
    /// Apply the command-line overrides on top of file and environment config
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(url) = &self.webdriver_url {
            config.browser.webdriver_url = Some(url.clone());
        }
        if let Some(headless) = self.headless {
            config.browser.headless = headless;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
    }
}

/// Arguments `cargo test` forwards to every test binary. Accepted so a
/// workspace-wide `cargo test -- --nocapture` still works; they have no effect.
#[derive(ClapArgs, Debug, Default)]
pub struct LibtestArgs {
    #[arg(hide = true)]
    pub filter: Vec<String>,

    #[arg(long, hide = true)]
    pub nocapture: bool,

    #[arg(long, hide = true)]
    pub show_output: bool,

    #[arg(short, long, hide = true)]
    pub quiet: bool,

    #[arg(long, hide = true)]
    pub exact: bool,

    #[arg(long, hide = true)]
    pub test_threads: Option<usize>,

    #[arg(long, hide = true)]
    pub color: Option<String>,

    #[arg(long, hide = true)]
    pub format: Option<String>,
}

impl LibtestArgs {
    /// Whether any forwarded test-harness argument was given
    pub fn any(&self) -> bool {
        !self.filter.is_empty()
            || self.nocapture
            || self.show_output
            || self.quiet
            || self.exact
            || self.test_threads.is_some()
            || self.color.is_some()
            || self.format.is_some()
    }
}
