use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::commands::utils::{self, ConfigOverrides};
use crate::server::{AppState, ServeSettings, router};
use crate::session::AttachRequest;

pub async fn handle_serve(
    host: String,
    port: u16,
    output_dir: PathBuf,
    profile: Option<String>,
    config: Option<PathBuf>,
    headless: bool,
) -> Result<()> {
    let config = utils::load_config(
        config,
        ConfigOverrides {
            headless,
            ..Default::default()
        },
    )?;
    let user_data_dir = utils::resolve_profile(profile)?;
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let state = AppState::new(ServeSettings {
        config,
        output_dir,
        user_data_dir,
        // Reuse a browser the user already logged in with when one is running
        attach: AttachRequest::Discover,
    });

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("Serving on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    state.shutdown().await;
    Ok(())
}
