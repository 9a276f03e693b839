// GeoMigrate - SQLite to PostgreSQL reference data migration
// Copyright (c) 2025 GeoMigrate Contributors
// Licensed under the MIT License

use clap::Parser;
use geomigrate::cli::commands::migrate::{EXIT_CONFIG, EXIT_FATAL};
use geomigrate::cli::Cli;
use geomigrate::config::resolve_config;
use geomigrate::logging::init_logging;
use std::path::Path;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match resolve_config(cli.config.as_deref().map(Path::new)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(EXIT_CONFIG);
        }
    };

    if let Some(level) = &cli.log_level {
        config.application.log_level = level.clone();
    }

    if let Err(e) = cli.migrate.apply_overrides(&mut config) {
        eprintln!("{e}");
        process::exit(EXIT_CONFIG);
    }

    let guard = match init_logging(&config.application.log_level, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_CONFIG);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "GeoMigrate - SQLite to PostgreSQL reference data migration"
    );

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                }
            }
            println!("\n⚠️  Shutdown signal received, rolling back open transactions...");
            let _ = shutdown_tx.send(true);
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                println!("\n⚠️  Shutdown signal received, rolling back open transactions...");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let exit_code = match cli.migrate.execute(config, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    drop(guard);
    process::exit(exit_code);
}
