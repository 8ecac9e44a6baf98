//! Claim engine binary for the Freehold land-claim service.
//!
//! This is the main entry point that wires together the estate registry,
//! billing, persistence, and moderation. It loads configuration,
//! restores persisted claim state, and runs the background tasks until a
//! shutdown signal arrives.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `freehold-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the snapshot store and restore claim state
//! 4. Purge estates of accounts banned while offline
//! 5. Wire the service facade and collaborators
//! 6. Spawn the billing, persistence, and ban-listener tasks
//! 7. Wait for Ctrl-C, stop the tasks, and run the final flush

mod bans;
mod config;
mod error;
mod service;
mod tasks;

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use freehold_billing::BillingEngine;
use freehold_billing::InMemoryEconomy;
use freehold_claims::{EstateRegistry, purge_banned};
use freehold_persist::{JsonStore, PersistenceCoordinator};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bans::StaticBanList;
use crate::config::FreeholdConfig;
use crate::error::EngineError;
use crate::service::{AllowAllClaims, ClaimService, EngineState, TracingSink};

/// Application entry point for the claim engine.
///
/// # Errors
///
/// Returns an error if configuration loading or the initial state restore
/// fails; runtime task failures are logged and retried instead.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!("freehold-engine starting");
    info!(
        data_dir = config.persistence.data_dir,
        save_interval_s = config.persistence.save_interval_seconds,
        sweep_interval_s = config.upkeep.sweep_interval_seconds,
        grace_period_days = config.upkeep.grace_period_days,
        "Configuration loaded"
    );

    // 3. Open the snapshot store and restore claim state.
    let coordinator = Arc::new(PersistenceCoordinator::new(Box::new(JsonStore::new(
        &config.persistence.data_dir,
    ))));
    let mut state = EngineState::new(EstateRegistry::new(config.world_rules.clone()));
    let loaded = coordinator.load_all(&mut state.registry, &mut state.queue)?;
    info!(
        estates = loaded.estates,
        skipped = loaded.skipped,
        requests = loaded.requests,
        "Claim state restored"
    );

    // 4. Purge estates of accounts banned while the engine was offline.
    let ban_list = StaticBanList::from_uuids(&config.banned_accounts);
    if !ban_list.is_empty() {
        let removed = purge_banned(&mut state.registry, &ban_list);
        info!(
            banned = ban_list.len(),
            removed, "Startup ban scan complete"
        );
    }

    // 5. Wire the service facade and collaborators.
    //    The in-memory economy and tracing sink serve standalone runs;
    //    hosts embedding the crates wire their own implementations.
    let state = Arc::new(RwLock::new(state));
    let economy = Arc::new(InMemoryEconomy::new());
    let sink = Arc::new(TracingSink);
    let service = ClaimService::new(
        Arc::clone(&state),
        Arc::clone(&economy) as _,
        Arc::clone(&sink) as _,
        Arc::new(AllowAllClaims),
        config.claim.schedule(),
    );
    info!(
        pending_expansions = service.pending_expansions().len(),
        "Claim service ready"
    );

    // 6. Spawn the background tasks.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (ban_tx, ban_rx) = mpsc::channel::<freehold_types::AccountId>(64);
    // Hosts push ban signals through this sender.
    let _ban_tx = ban_tx;

    let billing = tokio::spawn(tasks::billing_loop(
        Arc::clone(&state),
        BillingEngine::new(config.upkeep.to_upkeep_config()),
        economy,
        sink,
        Duration::from_secs(config.upkeep.sweep_interval_seconds),
        shutdown_rx.clone(),
    ));
    let persistence = tokio::spawn(tasks::persistence_loop(
        Arc::clone(&state),
        Arc::clone(&coordinator),
        Duration::from_secs(config.persistence.save_interval_seconds),
        shutdown_rx.clone(),
    ));
    let bans = tokio::spawn(tasks::ban_listener(
        Arc::clone(&state),
        ban_rx,
        shutdown_rx,
    ));
    info!("Background tasks started");

    // 7. Wait for shutdown, stop the tasks, and run the final flush.
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = billing.await;
    let _ = persistence.await;
    let _ = bans.await;

    // The final flush is mandatory and synchronous: whatever the periodic
    // cycle has not saved yet is written now.
    {
        let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
        let EngineState {
            registry, queue, ..
        } = &mut *guard;
        coordinator.flush(registry, queue)?;
    }
    info!("freehold-engine stopped");
    Ok(())
}

/// Load configuration, treating a missing file as all-defaults.
fn load_config() -> Result<FreeholdConfig, EngineError> {
    let path = Path::new("freehold-config.yaml");
    if path.exists() {
        Ok(FreeholdConfig::from_file(path)?)
    } else {
        let mut config = FreeholdConfig::default();
        config.persistence.apply_env_overrides();
        Ok(config)
    }
}
