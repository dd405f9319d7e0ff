//! Scenario runner: one fresh browser session per scenario, always released

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use shopcheck_common::HarnessConfig;

use crate::actions::Actions;
use crate::driver::{Connect, Driver};
use crate::error::{E2eError, E2eResult};
use crate::pages::LoginPage;
use crate::report::{Attachment, ReportCollector, Reporter, ResultsWriter, StepRecord};
use crate::scenarios::{Marker, Scenario, Severity};

/// Tag of the screenshot attached to failed scenarios
pub const FAILURE_SCREENSHOT: &str = "failure_screenshot";

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub title: String,
    pub severity: Severity,
    pub markers: Vec<Marker>,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub steps: Vec<StepRecord>,
    pub attachments: Vec<Attachment>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub environment: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

pub struct ScenarioRunner<C: Connect> {
    connector: C,
    config: Arc<HarnessConfig>,
    writer: ResultsWriter,
}

impl<C: Connect> ScenarioRunner<C> {
    pub fn new(connector: C, config: Arc<HarnessConfig>) -> Self {
        let writer = ResultsWriter::new(config.output_dir.clone());
        Self {
            connector,
            config,
            writer,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Run scenarios one after another
    pub async fn run_all(&self, scenarios: &[Scenario<C::Driver>]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        SuiteResult {
            environment: self.config.environment.clone(),
            started_at,
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run one scenario on a fresh session. The session is quit on every
    /// exit path, including a panicking scenario body.
    pub async fn run_scenario(&self, scenario: &Scenario<C::Driver>) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let collector = Arc::new(ReportCollector::new());
        let outcome = match self.connector.connect().await {
            Ok(driver) => {
                let driver = Arc::new(driver);
                let outcome = self.drive(scenario, Arc::clone(&driver), Arc::clone(&collector)).await;

                if outcome.is_err() && self.config.screenshot_on_failure {
                    match driver.screenshot_png().await {
                        Ok(png) => collector.attach(Attachment::png(FAILURE_SCREENSHOT, png)),
                        Err(e) => debug!("No failure screenshot for {}: {}", scenario.name, e),
                    }
                }

                if let Err(e) = driver.quit().await {
                    warn!("Failed to quit session for {}: {}", scenario.name, e);
                }
                outcome
            }
            Err(e) => Err(e),
        };

        let report = collector.take();
        ScenarioResult {
            name: scenario.name.clone(),
            title: scenario.title.clone(),
            severity: scenario.severity,
            markers: scenario.markers.clone(),
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
            steps: report.steps,
            attachments: report.attachments,
        }
    }

    async fn drive(
        &self,
        scenario: &Scenario<C::Driver>,
        driver: Arc<C::Driver>,
        collector: Arc<ReportCollector>,
    ) -> E2eResult<()> {
        let actions = Actions::new(driver, collector, &self.config);
        let page = LoginPage::new(actions, Arc::clone(&self.config));

        let body = async {
            page.open().await?;
            scenario.run(&page).await
        };

        match AssertUnwindSafe(body).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(E2eError::ScenarioPanicked(panic_message(panic.as_ref()))),
        }
    }

    /// Write attachments and `test-results.json` under the output directory
    pub fn write_results(&self, results: &mut SuiteResult) -> E2eResult<PathBuf> {
        for result in &mut results.results {
            self.writer
                .write_attachments(&result.name, &mut result.attachments)?;
        }
        self.writer.write_results(results)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
