//! kvpace CLI main entry point

use anyhow::{Context, Result};
use clap::Parser;
use kvpace_config::{ConfigLoader, KvpaceConfig};
use kvpace_core::Engine;
use kvpace_logging::init_logging_from_config;
use kvpace_wire::TcpConnector;
use std::sync::Arc;
use tracing::{info, warn};

mod cli;
mod output;

use cli::{Cli, Commands, ConfigCommands, OutputFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, fallback) = ConfigLoader::new()
        .load_lenient(cli.config.as_ref())
        .context("Failed to apply environment overrides")?;
    cli.apply_overrides(&mut config);
    config.normalize();

    init_logging_from_config(&config.logging)?;
    if let (Some(path), Some(e)) = (&cli.config, fallback) {
        warn!("Using default parameters, could not load {}: {}", path.display(), e);
    }

    match &cli.command {
        Some(Commands::Config { config_cmd }) => handle_config_command(config_cmd, &config),
        None => run(config, cli.format).await,
    }
}

fn handle_config_command(cmd: &ConfigCommands, config: &KvpaceConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let yaml = config.to_yaml().context("Failed to render configuration")?;
            print!("{}", yaml);
            Ok(())
        }
        ConfigCommands::Generate { output } => {
            let sample = KvpaceConfig::generate_sample();
            match output {
                Some(path) => {
                    std::fs::write(path, sample)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Sample configuration written to {}", path.display());
                }
                None => print!("{}", sample),
            }
            Ok(())
        }
    }
}

async fn run(config: KvpaceConfig, format: OutputFormat) -> Result<()> {
    let engine =
        Engine::new(config, Arc::new(TcpConnector::new())).context("Invalid parameters")?;
    let mut handle = engine.start().context("Failed to start workers")?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                return Ok(());
            }
            snapshot = handle.next_snapshot() => match snapshot {
                Ok(snapshot) => println!("{}", output::render(&snapshot, format)?),
                // Unreachable target or a run that ended on its own
                Err(e) => return Err(e).context("Load stopped"),
            },
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
