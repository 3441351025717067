/// Process entry point (SPEC_FULL.md §2, §4.8): builds the forensic
/// dependency container, starts the background sweeps, and blocks until a
/// shutdown signal arrives.
use std::sync::Arc;

use tokio::sync::Notify;

use crate::analysis::Forensics;
use crate::logger::{self, LogTag};

pub async fn run_bot() -> Result<(), String> {
    crate::config::load_config().map_err(|e| format!("failed to load config: {}", e))?;
    logger::info(LogTag::System, "configuration loaded");

    let forensics = Forensics::from_global_config().await?;
    logger::info(LogTag::System, "forensic pipeline initialized");

    let shutdown = Arc::new(Notify::new());
    let sweep_handles = forensics.sweeper().start_all(shutdown.clone());
    logger::info(LogTag::System, "sweeps running - forensic pipeline is up");

    wait_for_shutdown_signal().await?;

    logger::info(LogTag::System, "shutdown signal received, stopping sweeps");
    shutdown.notify_waiters();
    for handle in sweep_handles {
        let _ = handle.await;
    }

    logger::info(LogTag::System, "shut down cleanly");
    Ok(())
}

/// First Ctrl+C asks running sweeps to stop; a second forces an immediate
/// exit.
async fn wait_for_shutdown_signal() -> Result<(), String> {
    logger::info(LogTag::System, "waiting for Ctrl+C (press twice to force kill)");

    tokio::signal::ctrl_c().await.map_err(|e| format!("failed to listen for shutdown signal: {}", e))?;
    logger::warning(LogTag::System, "shutdown signal received, press Ctrl+C again to force kill");

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::error(LogTag::System, "second Ctrl+C detected, forcing immediate exit");
            std::process::exit(130);
        }
    });

    Ok(())
}
