//! Finding an already-running browser that exposes a remote debugging port.

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ports a debuggable Chrome is usually started on
pub const DEBUGGING_PORTS: [u16; 3] = [9222, 9223, 9224];

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
}

/// Probe the usual local debugging ports and return the first browser's
/// DevTools WebSocket URL. Finding nothing is not an error.
pub async fn find_debugger_endpoint() -> Option<String> {
    find_debugger_endpoint_on("localhost", &DEBUGGING_PORTS).await
}

/// Probe `GET http://{host}:{port}/json/version` for each port in order
pub async fn find_debugger_endpoint_on(host: &str, ports: &[u16]) -> Option<String> {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build discovery client: {}", e);
            return None;
        }
    };

    for port in ports {
        let url = format!("http://{}:{}/json/version", host, port);
        let response = match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!("{} answered {}", url, response.status());
                continue;
            }
            Err(e) => {
                debug!("No debugger at {}: {}", url, e);
                continue;
            }
        };

        match response.json::<VersionInfo>().await {
            Ok(VersionInfo {
                web_socket_debugger_url: Some(endpoint),
            }) => {
                info!("Found browser debugging WebSocket at port {}", port);
                return Some(endpoint);
            }
            Ok(_) => debug!("{} has no webSocketDebuggerUrl", url),
            Err(e) => debug!("Unreadable version info from {}: {}", url, e),
        }
    }

    warn!("Could not find an existing browser debugging session");
    None
}
