#![cfg_attr(not(test), deny(clippy::panic))]

use std::sync::Arc;

use clap::Parser;
use worms_lobby_server::config;
use worms_lobby_server::logging;
use worms_lobby_server::server::{acceptor, shutdown, ServerContext};

/// A TCP lobby server for the Worms2-family legacy binary protocol.
#[derive(Parser, Debug)]
#[command(name = "worms-lobby-server")]
#[command(about = "A TCP lobby server for the Worms2-family legacy binary protocol")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,

    /// Override the configured listen port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load();
    if let Some(port) = cli.port {
        cfg.port = port;
    }

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  Max connections: {}", cfg.server.max_connections);
                println!("  Login timeout: {}s", cfg.server.login_timeout_secs);
                println!("  Idle timeout: {}s", cfg.server.idle_timeout_secs);
                println!("  Code page: {:?}", cfg.server.code_page);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    logging::init_with_config(&cfg.logging);

    let ctx = Arc::new(ServerContext::new(cfg));

    let shutdown_ctx = ctx.clone();
    tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        tracing::info!("shutdown signal received");
        shutdown_ctx.shutdown.notify_waiters();
    });

    acceptor::run(ctx).await?;
    Ok(())
}
