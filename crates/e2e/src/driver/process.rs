//! Driver process management - spawning and health checking chromedriver/geckodriver

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{BrowserKind, SuiteConfig};
use crate::error::{E2eError, E2eResult};

/// Lines of driver stderr kept for startup errors
const STDERR_TAIL: usize = 20;

/// Time a driver gets to exit after SIGTERM before it is killed
const STOP_GRACE: Duration = Duration::from_millis(300);

/// Handle to a running driver process
pub struct DriverProcess {
    child: Option<Child>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
    stderr_reader: Option<JoinHandle<()>>,
    pub url: String,
    pub port: u16,
}

impl DriverProcess {
    /// Spawn the driver binary and wait until it reports ready
    pub async fn spawn(config: DriverConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };

        info!("Spawning {} on port {}", config.binary_path.display(), port);

        let child = Command::new(&config.binary_path)
            .args(port_args(config.browser, port))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    E2eError::DriverNotFound(config.binary_path.display().to_string())
                }
                _ => E2eError::DriverStartup(format!(
                    "Failed to spawn {}: {}",
                    config.binary_path.display(),
                    e
                )),
            })?;

        let mut handle = DriverProcess::adopt(child, port);

        handle.wait_for_ready(config.startup_timeout).await?;

        info!("WebDriver is ready at {}", handle.url);
        Ok(handle)
    }

    /// Take ownership of a spawned driver and drain its stderr
    fn adopt(mut child: Child, port: u16) -> Self {
        let stderr_tail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL)));
        let stderr_reader = child
            .stderr
            .take()
            .map(|stderr| drain_stderr(stderr, Arc::clone(&stderr_tail)));
        DriverProcess {
            child: Some(child),
            stderr_tail,
            stderr_reader,
            url: format!("http://127.0.0.1:{}", port),
            port,
        }
    }

    /// Poll `/status` until the driver accepts sessions
    async fn wait_for_ready(&mut self, timeout_duration: Duration) -> E2eResult<()> {
        let status_url = format!("{}/status", self.url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            if let Some(status) = self.exit_status() {
                self.settle_stderr().await;
                return Err(E2eError::DriverStartup(format!(
                    "driver exited with {} before it was ready: {}",
                    status,
                    self.stderr_summary()
                )));
            }

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body: serde_json::Value = resp.json().await.unwrap_or_default();
                    if status_is_ready(&body) {
                        return Ok(());
                    }
                }
                Ok(resp) => {
                    warn!("Driver status returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for driver to start...");
                    }
                    if !e.is_connect() {
                        warn!("Driver status error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        warn!("Driver never became ready: {}", self.stderr_summary());
        Err(E2eError::DriverHealthCheck(attempts))
    }

    fn exit_status(&mut self) -> Option<std::process::ExitStatus> {
        self.child.as_mut()?.try_wait().ok().flatten()
    }

    /// Give the reader a moment to pick up the last lines of a dead driver
    async fn settle_stderr(&mut self) {
        let deadline = Instant::now() + Duration::from_millis(500);
        while let Some(reader) = &self.stderr_reader {
            if reader.is_finished() || Instant::now() >= deadline {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    fn stderr_summary(&self) -> String {
        let tail = self.stderr_tail.lock();
        if tail.is_empty() {
            "no stderr output".to_string()
        } else {
            tail.iter().cloned().collect::<Vec<_>>().join(" | ")
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Terminate the driver. Only the first call signals the process.
    pub fn stop(&mut self) -> E2eResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if let Ok(Some(status)) = child.try_wait() {
            debug!("Driver already exited with {}", status);
            return Ok(());
        }

        info!("Stopping driver (pid: {})", child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                let deadline = Instant::now() + STOP_GRACE;
                while Instant::now() < deadline {
                    if let Ok(Some(_)) = child.try_wait() {
                        return Ok(());
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }

        let _ = child.kill();
        let _ = child.wait();

        Ok(())
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Forward driver stderr to debug logs so the pipe never fills up
fn drain_stderr(stderr: ChildStderr, tail: Arc<Mutex<VecDeque<String>>>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for line in BufReader::new(stderr).lines() {
            let Ok(line) = line else { break };
            debug!(target: "webdriver", "{}", line);
            let mut tail = tail.lock();
            if tail.len() == STDERR_TAIL {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    })
}

/// Configuration for spawning a driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub binary_path: PathBuf,

    pub browser: BrowserKind,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    pub startup_timeout: Duration,
}

impl DriverConfig {
    pub fn for_suite(config: &SuiteConfig) -> Self {
        Self {
            binary_path: config.driver_binary(),
            browser: config.browser,
            ..Self::default()
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("chromedriver"),
            browser: BrowserKind::Chrome,
            port: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

fn port_args(browser: BrowserKind, port: u16) -> Vec<String> {
    match browser {
        BrowserKind::Chrome => vec![format!("--port={}", port)],
        BrowserKind::Firefox => vec!["--port".to_string(), port.to_string()],
    }
}

fn status_is_ready(body: &serde_json::Value) -> bool {
    body.pointer("/value/ready")
        .and_then(|v| v.as_bool())
        .unwrap_or(true)
}

fn find_free_port() -> E2eResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Wait until `url` answers any HTTP response
pub async fn wait_for_http(url: &str, timeout_duration: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let start = Instant::now();

    while start.elapsed() < timeout_duration {
        match client.get(url).send().await {
            Ok(_) => return Ok(()),
            Err(e) if !e.is_connect() => warn!("Probe of {} failed: {}", url, e),
            Err(_) => {}
        }
        sleep(Duration::from_millis(250)).await;
    }

    Err(E2eError::Timeout(format!("{} to accept connections", url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port = find_free_port().unwrap();
        assert!(port > 1024);
    }

    #[test]
    fn port_flags_per_driver() {
        assert_eq!(port_args(BrowserKind::Chrome, 9515), vec!["--port=9515"]);
        assert_eq!(port_args(BrowserKind::Firefox, 4444), vec!["--port", "4444"]);
    }

    #[test]
    fn status_readiness() {
        assert!(status_is_ready(&serde_json::json!({"value": {"ready": true}})));
        assert!(!status_is_ready(&serde_json::json!({"value": {"ready": false}})));
        assert!(status_is_ready(&serde_json::json!({})));
    }

    #[cfg(unix)]
    #[test]
    fn second_stop_is_a_no_op() {
        let child = Command::new("sleep")
            .arg("30")
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut driver = DriverProcess::adopt(child, 9515);

        driver.stop().unwrap();
        assert!(driver.child.is_none());
        let started = Instant::now();
        driver.stop().unwrap();
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[cfg(unix)]
    #[test]
    fn chatty_stderr_is_drained() {
        let child = Command::new("sh")
            .args(["-c", "yes driver-log | head -c 1000000 >&2; echo ready >&2; sleep 30"])
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut driver = DriverProcess::adopt(child, 9515);

        let deadline = Instant::now() + Duration::from_secs(10);
        while !driver.stderr_summary().ends_with("ready") && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(driver.stderr_summary().ends_with("ready"));
        assert!(driver.stderr_tail.lock().len() <= STDERR_TAIL);
        driver.stop().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn early_exit_reports_stderr() {
        let child = Command::new("sh")
            .args(["-c", "echo 'port already in use' >&2; exit 3"])
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut driver = DriverProcess::adopt(child, find_free_port().unwrap());

        match driver.wait_for_ready(Duration::from_secs(5)).await {
            Err(E2eError::DriverStartup(message)) => {
                assert!(message.contains("port already in use"), "{}", message)
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let config = DriverConfig {
            binary_path: PathBuf::from("definitely-not-a-webdriver-binary"),
            startup_timeout: Duration::from_millis(100),
            ..DriverConfig::default()
        };
        match DriverProcess::spawn(config).await {
            Err(E2eError::DriverNotFound(name)) => {
                assert!(name.contains("definitely-not-a-webdriver-binary"))
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("spawn should fail"),
        }
    }
}
