use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

const DRIVER_COMMAND: &str = "chromedriver";

/// Ports tried before falling back to an OS-assigned one
const PREFERRED_PORTS: [u16; 3] = [9515, 9516, 9517];

/// Manages chromedriver processes started on behalf of the scraper
pub struct WebDriverManager {
    processes: Mutex<Vec<DriverProcess>>,
}

struct DriverProcess {
    child: Child,
    port: u16,
    url: String,
    #[cfg(unix)]
    process_group_id: Option<i32>,
}

impl Default for WebDriverManager {
    fn default() -> Self {
        Self {
            processes: Mutex::new(Vec::new()),
        }
    }
}

impl WebDriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn processes(&self) -> MutexGuard<'_, Vec<DriverProcess>> {
        self.processes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ensure a chromedriver is running and return the URL to connect to
    pub async fn ensure_driver(&self) -> Result<String> {
        let managed_urls: Vec<String> = self.processes().iter().map(|p| p.url.clone()).collect();

        for url in managed_urls {
            if Self::verify_driver_working(&url).await {
                debug!("Using existing managed WebDriver at {}", url);
                return Ok(url);
            }
        }

        // A driver started outside this process on the standard port
        let external = format!("http://localhost:{}", PREFERRED_PORTS[0]);
        if Self::verify_driver_working(&external).await {
            debug!("Found external WebDriver at {}", external);
            return Ok(external);
        }

        info!("WebDriver not detected, attempting to start automatically...");
        self.start_driver().await
    }

    async fn start_driver(&self) -> Result<String> {
        let port = Self::find_free_port()?;
        info!("Starting {} on port {}", DRIVER_COMMAND, port);

        if !Self::command_exists(DRIVER_COMMAND) {
            anyhow::bail!(
                "{} not found in PATH. Please install it:\n\
                  macOS: brew install {}\n\
                  Linux: Download from https://googlechromelabs.github.io/chrome-for-testing/",
                DRIVER_COMMAND,
                DRIVER_COMMAND
            );
        }

        let mut cmd = Command::new(DRIVER_COMMAND);
        cmd.arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // New process group so the driver and its browsers die together
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {}", DRIVER_COMMAND))?;

        #[cfg(unix)]
        let process_group_id = i32::try_from(child.id()).ok();

        let url = format!("http://localhost:{}", port);
        self.processes().push(DriverProcess {
            child,
            port,
            url: url.clone(),
            #[cfg(unix)]
            process_group_id,
        });

        // 3 seconds total
        let max_attempts = 30;
        for attempt in 1..=max_attempts {
            if Self::is_driver_running(&url).await {
                info!("WebDriver started successfully on port {}", port);
                return Ok(url);
            }
            if attempt < max_attempts {
                sleep(Duration::from_millis(100)).await;
            }
        }

        self.cleanup_failed_process(port);
        anyhow::bail!("WebDriver failed to start within timeout")
    }

    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        #[cfg(unix)]
        let finder = "which";
        #[cfg(windows)]
        let finder = "where";

        Command::new(finder)
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// First free preferred port, else one assigned by the OS
    pub fn find_free_port() -> Result<u16> {
        for port in PREFERRED_PORTS {
            if !Self::is_port_in_use(port) {
                debug!("Found free port {}", port);
                return Ok(port);
            }
            debug!("Port {} is in use", port);
        }

        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }

    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// Whether `/status` answers with a success code
    pub async fn is_driver_running(url: &str) -> bool {
        let status_url = format!("{}/status", url);

        match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Whether `/status` reports `value.ready == true`
    async fn verify_driver_working(url: &str) -> bool {
        let status_url = format!("{}/status", url);

        let response = match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => response,
            Err(_) => return false,
        };

        match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("value")
                .and_then(|v| v.get("ready"))
                .and_then(|r| r.as_bool())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Kill every managed driver and start over on the next `ensure_driver`
    pub fn restart(&self) {
        info!("Discarding managed WebDriver processes");
        self.stop_all();
    }

    #[cfg(unix)]
    fn kill_process_group(pgid: i32) {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let group = Pid::from_raw(pgid);
        if let Err(e) = killpg(group, Signal::SIGTERM) {
            debug!("Failed to send SIGTERM to process group {}: {}", pgid, e);
        }

        std::thread::sleep(Duration::from_millis(100));

        // ESRCH here means the group already exited
        if let Err(e) = killpg(group, Signal::SIGKILL) {
            debug!("SIGKILL to process group {}: {}", pgid, e);
        }
    }

    fn terminate(process: &mut DriverProcess) {
        #[cfg(unix)]
        if let Some(pgid) = process.process_group_id {
            info!(
                "Killing process group {} for WebDriver on port {}",
                pgid, process.port
            );
            Self::kill_process_group(pgid);
        }

        let _ = process.child.kill();
        let _ = process.child.wait();
    }

    fn cleanup_failed_process(&self, port: u16) {
        let mut processes = self.processes();
        if let Some(index) = processes.iter().position(|p| p.port == port) {
            let mut process = processes.remove(index);
            Self::terminate(&mut process);
        }
    }

    /// Stop all managed WebDriver processes
    pub fn stop_all(&self) {
        let mut processes = self.processes();
        for process in processes.iter_mut() {
            debug!("Stopping WebDriver on port {}", process.port);
            Self::terminate(process);
        }
        processes.clear();
    }

    /// Number of drivers this manager started and still tracks
    pub fn managed_count(&self) -> usize {
        self.processes().len()
    }
}

impl Drop for WebDriverManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

lazy_static::lazy_static! {
    pub static ref GLOBAL_WEBDRIVER_MANAGER: WebDriverManager = WebDriverManager::new();
}

#[cfg(test)]
#[path = "webdriver_manager_test.rs"]
mod webdriver_manager_test;
