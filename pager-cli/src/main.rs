mod args;
mod commands;
mod config;

use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Parse arguments; clap exits with status 2 on errors
    let cli = args::Cli::parse();

    // Load configuration
    let config = match config::PagerConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Run the command until it finishes or the process is asked to stop
    tokio::select! {
        result = commands::run(cli, &config) => {
            if let Err(e) = result {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            std::process::exit(130);
        }
    }
}

// Simple signal handler that works on all platforms
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        },
        _ = terminate => {
            info!("Received SIGTERM, stopping");
        }
    }
}
