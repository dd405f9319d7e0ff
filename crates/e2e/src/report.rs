//! Reporting sink: step annotations and binary attachments
//!
//! Actions and scenarios report into a [`Reporter`]; the runner gives each
//! scenario its own [`ReportCollector`] and persists what it gathered with a
//! [`ResultsWriter`].

use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, Instrument};

use crate::error::E2eResult;

pub const PNG: &str = "image/png";

/// A named binary attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub sha256: String,
    pub size: usize,
    /// File the bytes were written to, once persisted
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let sha256 = hex::encode(Sha256::digest(&bytes));
        Self {
            name: name.into(),
            content_type: content_type.into(),
            sha256,
            size: bytes.len(),
            path: None,
            bytes,
        }
    }

    pub fn png(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, PNG, bytes)
    }

    fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            PNG => "png",
            "application/json" => "json",
            "text/plain" => "txt",
            _ => "bin",
        }
    }
}

/// Outcome of one annotated step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub label: String,
    pub depth: usize,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Receives step annotations and attachments
pub trait Reporter: Send + Sync {
    fn attach(&self, attachment: Attachment);

    fn step_started(&self, label: &str);

    fn step_finished(&self, label: &str, success: bool, duration_ms: u64, error: Option<String>);
}

/// Everything reported for one scenario
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepRecord>,
    pub attachments: Vec<Attachment>,
}

#[derive(Default)]
struct CollectorState {
    depth: usize,
    report: ScenarioReport,
}

/// In-memory reporter for a single scenario
#[derive(Default)]
pub struct ReportCollector {
    state: Mutex<CollectorState>,
}

impl ReportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the attachments gathered so far
    pub fn attachment_names(&self) -> Vec<String> {
        self.state
            .lock()
            .report
            .attachments
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    /// Take the collected report, leaving the collector empty
    pub fn take(&self) -> ScenarioReport {
        let mut state = self.state.lock();
        state.depth = 0;
        std::mem::take(&mut state.report)
    }
}

impl Reporter for ReportCollector {
    fn attach(&self, attachment: Attachment) {
        debug!(
            name = %attachment.name,
            size = attachment.size,
            "attachment recorded"
        );
        self.state.lock().report.attachments.push(attachment);
    }

    fn step_started(&self, _label: &str) {
        self.state.lock().depth += 1;
    }

    fn step_finished(&self, label: &str, success: bool, duration_ms: u64, error: Option<String>) {
        let mut state = self.state.lock();
        state.depth = state.depth.saturating_sub(1);
        let depth = state.depth;
        state.report.steps.push(StepRecord {
            label: label.to_string(),
            depth,
            success,
            duration_ms,
            error,
        });
    }
}

/// Run `fut` as a named report step inside a tracing span
pub async fn step<T, F>(reporter: &dyn Reporter, label: impl Into<String>, fut: F) -> E2eResult<T>
where
    F: Future<Output = E2eResult<T>>,
{
    let label = label.into();
    let span = tracing::debug_span!("step", label = %label);
    reporter.step_started(&label);
    let start = Instant::now();

    let result = fut.instrument(span).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let error = result.as_ref().err().map(|e| e.to_string());
    reporter.step_finished(&label, result.is_ok(), duration_ms, error);
    result
}

/// Persists results and attachments under an output directory
pub struct ResultsWriter {
    output_dir: PathBuf,
}

impl ResultsWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write each attachment to `attachments/<scenario>/<index>-<name>.<ext>`
    /// and record the path on the attachment.
    pub fn write_attachments(&self, scenario: &str, attachments: &mut [Attachment]) -> E2eResult<()> {
        if attachments.is_empty() {
            return Ok(());
        }

        let dir = self.output_dir.join("attachments").join(sanitize(scenario));
        std::fs::create_dir_all(&dir)?;

        for (index, attachment) in attachments.iter_mut().enumerate() {
            let file_name = format!(
                "{:02}-{}.{}",
                index,
                sanitize(&attachment.name),
                attachment.extension()
            );
            let path = dir.join(file_name);
            std::fs::write(&path, &attachment.bytes)?;
            attachment.path = Some(path);
        }

        Ok(())
    }

    /// Write results to `test-results.json`
    pub fn write_results<T: Serialize>(&self, results: &T) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::E2eError;

    #[test]
    fn test_attachment_hash() {
        let attachment = Attachment::png("screenshot", b"abc".to_vec());
        assert_eq!(
            attachment.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(attachment.size, 3);
        assert_eq!(attachment.content_type, PNG);
    }

    #[tokio::test]
    async fn test_nested_steps_are_recorded_innermost_first() {
        let collector = ReportCollector::new();

        let result: E2eResult<u32> = step(&collector, "outer", async {
            step(&collector, "inner", async { Ok(()) }).await?;
            Ok(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);

        let report = collector.take();
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].label, "inner");
        assert_eq!(report.steps[0].depth, 1);
        assert_eq!(report.steps[1].label, "outer");
        assert_eq!(report.steps[1].depth, 0);
        assert!(report.steps.iter().all(|s| s.success));
    }

    #[tokio::test]
    async fn test_failed_step_keeps_error() {
        let collector = ReportCollector::new();

        let result: E2eResult<()> = step(&collector, "check banner", async {
            Err(E2eError::AssertionFailed("banner missing".to_string()))
        })
        .await;
        assert!(result.is_err());

        let report = collector.take();
        assert!(!report.steps[0].success);
        assert!(report.steps[0]
            .error
            .as_deref()
            .unwrap()
            .contains("banner missing"));
    }

    #[test]
    fn test_write_attachments_and_results() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultsWriter::new(dir.path());

        let mut attachments = vec![
            Attachment::png("screenshot", vec![1, 2, 3]),
            Attachment::png("failure_screenshot", vec![4, 5]),
        ];
        writer
            .write_attachments("login_with_user_types[locked]", &mut attachments)
            .unwrap();

        let first = attachments[0].path.clone().unwrap();
        assert!(first.ends_with("attachments/login_with_user_types_locked_/00-screenshot.png"));
        assert_eq!(std::fs::read(&first).unwrap(), vec![1, 2, 3]);
        let second = attachments[1].path.clone().unwrap();
        assert!(second.ends_with("01-failure_screenshot.png"));

        let path = writer.write_results(&attachments).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written[0]["name"], "screenshot");
        assert!(written[0].get("bytes").is_none());
    }
}
