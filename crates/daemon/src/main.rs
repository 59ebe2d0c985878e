//! Ledger RPC - Main Entry Point
//! Serves ingested ledger history over JSON-RPC behind backlog and duration limits

mod config;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use crate::config::{Cli, Config};
use ledger_rpc_api::{start_admin, RpcDeps, RpcServer};
use ledger_rpc_core::application::backfill_fee_windows;
use ledger_rpc_core::feewindow::FeeWindows;
use ledger_rpc_core::port::time_provider::SystemTimeProvider;
use ledger_rpc_infra_sqlite::{create_pool, run_migrations, SqliteLedgerRepository};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn database_url(db_path: &str) -> String {
    if db_path.starts_with("sqlite:") {
        db_path.to_string()
    } else {
        format!("sqlite://{db_path}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    telemetry::init_logging(&config)?;

    info!(version = VERSION, endpoint = %config.endpoint, "Ledger RPC starting...");

    // 2. Database
    info!(db_path = %config.db_path, "Initializing database...");
    let pool = create_pool(&database_url(&config.db_path))
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;
    let repository = Arc::new(SqliteLedgerRepository::new(pool));

    // 3. Fee windows, warmed from stored ledgers
    let fee_windows = Arc::new(
        FeeWindows::new(
            config.classic_fee_stats_retention_window,
            config.soroban_fee_stats_retention_window,
            config.network_passphrase.clone(),
        )
        .context("invalid fee window configuration")?,
    );
    let replayed = backfill_fee_windows(
        &fee_windows,
        repository.as_ref(),
        repository.as_ref(),
        config.fee_backfill_window(),
    )
    .await
    .context("fee window backfill failed")?;
    info!(ledgers = replayed, "Fee windows ready");

    // 4. JSON-RPC server
    let server = RpcServer::new(
        config.rpc_server_config(),
        RpcDeps {
            ledger_reader: repository,
            fee_windows,
            clock: Arc::new(SystemTimeProvider),
        },
    )
    .context("RPC server setup failed")?;
    let (addr, handle) = server.start().await.context("RPC server start failed")?;

    // 5. Admin endpoint for Prometheus scrapes
    let admin = match config.admin_endpoint() {
        Some(endpoint) => {
            let (admin_addr, admin) = start_admin(endpoint, server.metrics().clone())
                .await
                .context("admin server start failed")?;
            info!(endpoint = %admin_addr, "Metrics exposed at /metrics");
            Some(admin)
        }
        None => None,
    };

    info!(endpoint = %addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    handle.stop().context("RPC server stop failed")?;
    if let Some(admin) = &admin {
        admin.stop();
    }
    handle.stopped().await;
    if let Some(admin) = admin {
        admin.stopped().await;
    }
    telemetry::shutdown();

    info!("Shutdown complete.");
    Ok(())
}
