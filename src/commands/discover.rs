use anyhow::Result;
use serde_json::json;

use crate::discovery::{DEBUGGING_PORTS, find_debugger_endpoint};
use crate::types::OutputFormat;

pub async fn handle_discover(format: OutputFormat) -> Result<()> {
    let endpoint = find_debugger_endpoint().await;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "endpoint": endpoint }))?
            );
        }
        OutputFormat::Simple => match endpoint {
            Some(endpoint) => println!("{}", endpoint),
            None => println!(
                "No debuggable browser found on ports {:?}. Start Chrome with --remote-debugging-port=9222",
                DEBUGGING_PORTS
            ),
        },
    }
    Ok(())
}
