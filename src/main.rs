use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use mcpanel::config::Config;
use mcpanel::logging::init_tracing;
use mcpanel::panel::Panel;
use mcpanel::pty::PtyLauncher;
use mcpanel::server::PanelServer;

/// Web control panel for a Minecraft server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/mcpanel/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.bind_addr`
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Start the game server right away
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config_path = cli.config.unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.apply_env_overrides()?;

    let addr = match cli.bind {
        Some(addr) => addr,
        None => config.bind_addr()?,
    };
    if !config.auth.enabled && !addr.ip().is_loopback() {
        tracing::warn!(%addr, "Auth is disabled and the panel is reachable from the network");
    }
    tracing::info!(
        config = %config_path.display(),
        jar = %config.process.artifact_path().display(),
        "Starting mcpanel"
    );

    let panel = Panel::new(&config, Arc::new(PtyLauncher::new()));

    let mut server = PanelServer::new(panel.hub.clone());
    server.try_bind(addr).await?;
    let shutdown = server.shutdown_handle();
    let mut server_task = tokio::spawn(server.run());

    if cli.autostart {
        if let Err(err) = panel.supervisor.spawn() {
            tracing::error!(error = %err, "Autostart failed");
        }
    }

    tokio::select! {
        result = shutdown.wait_for_signal() => result?,
        result = &mut server_task => {
            // The API stopped on its own; still bring the game server down.
            panel.supervisor.shutdown(config.server.shutdown_grace()).await;
            return Ok(result??);
        }
    }

    panel.supervisor.shutdown(config.server.shutdown_grace()).await;
    shutdown.signal_shutdown();
    server_task.await??;
    tracing::info!("Goodbye");
    Ok(())
}
