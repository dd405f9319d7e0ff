//! Driver service management - spawning and health checking chromedriver

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{info, warn};

use shopcheck_common::BrowserConfig;

use crate::error::{E2eError, E2eResult};

/// Handle to a running chromedriver process
pub struct DriverService {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    value: StatusValue,
}

#[derive(Debug, Deserialize)]
struct StatusValue {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    message: String,
}

impl DriverService {
    /// Spawn chromedriver and wait until it accepts sessions
    pub async fn spawn(config: ServiceConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning {} on port {}", config.binary_path.display(), port);

        let child = Command::new(&config.binary_path)
            .arg(format!("--port={}", port))
            .arg("--silent")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                E2eError::ServiceStartup(format!(
                    "Failed to spawn {}: {}",
                    config.binary_path.display(),
                    e
                ))
            })?;

        let handle = DriverService {
            child,
            base_url: base_url.clone(),
            port,
        };

        // Dropping the handle on failure stops the process
        handle.wait_for_ready(config.startup_timeout).await?;

        info!("Driver service is ready at {}", base_url);
        Ok(handle)
    }

    /// Poll `/status` until the service reports ready
    async fn wait_for_ready(&self, timeout_duration: Duration) -> E2eResult<()> {
        let status_url = format!("{}/status", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => match resp.json::<StatusResponse>().await {
                    Ok(status) if status.value.ready => return Ok(()),
                    Ok(status) => {
                        warn!("Driver service not ready: {}", status.value.message);
                    }
                    Err(e) => {
                        warn!("Unreadable status response: {}", e);
                    }
                },
                Ok(resp) => {
                    warn!("Status check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for driver service to start...");
                    }
                    // Connection refused is expected while the service is starting
                    if !e.is_connect() {
                        warn!("Status check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::ServiceHealthCheck(attempts))
    }

    /// Get the base URL for this service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the service
    pub fn stop(&mut self) -> E2eResult<()> {
        info!("Stopping driver service (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(200));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        self.child.wait()?;

        Ok(())
    }
}

impl Drop for DriverService {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.stop();
        }
    }
}

/// Configuration for spawning a driver service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to the chromedriver binary
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for service startup
    pub startup_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_browser(browser: &BrowserConfig) -> Self {
        Self {
            binary_path: browser.chromedriver_path.clone(),
            port: browser.chromedriver_port,
            startup_timeout: browser.service_startup_timeout(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_browser(&BrowserConfig::default())
    }
}

/// Find a free port to use
fn find_free_port() -> E2eResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
