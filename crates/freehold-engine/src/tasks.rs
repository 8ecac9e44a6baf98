//! Background tasks: the billing sweep, the persistence cycle, and the
//! ban-signal listener.
//!
//! Every task follows the same shape: a `tokio::time::interval` (or a
//! channel) raced against the shared `watch` shutdown signal with
//! `tokio::select!`. The billing pass takes a stable id snapshot under a
//! short read lock, then a bounded write lock per estate, checking the
//! shutdown signal between estates -- never mid-mutation and never across
//! a whole sweep.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use freehold_billing::{BillingEngine, Economy, SweepSummary};
use freehold_claims::purge;
use freehold_persist::PersistenceCoordinator;
use freehold_types::{AccountId, NotificationSink};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::service::EngineState;

/// Run billing sweeps until shutdown.
pub async fn billing_loop(
    state: Arc<RwLock<EngineState>>,
    engine: BillingEngine,
    economy: Arc<dyn Economy>,
    sink: Arc<dyn NotificationSink>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it so startup stays quiet.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let summary =
                    billing_pass(&state, &engine, economy.as_ref(), sink.as_ref(), &shutdown);
                debug!(visited = summary.visited, "billing pass finished");
            }
            _ = shutdown.changed() => {
                info!("billing task stopping");
                return;
            }
        }
    }
}

/// One sweep over a stable id snapshot, with a bounded write lock per
/// estate and a shutdown check between estates.
fn billing_pass(
    state: &Arc<RwLock<EngineState>>,
    engine: &BillingEngine,
    economy: &dyn Economy,
    sink: &dyn NotificationSink,
    shutdown: &watch::Receiver<bool>,
) -> SweepSummary {
    let now = Utc::now();
    let ids = {
        let guard = state.read().unwrap_or_else(PoisonError::into_inner);
        guard.registry.estate_ids()
    };

    let mut summary = SweepSummary::default();
    for id in ids {
        if *shutdown.borrow() {
            info!("billing pass interrupted by shutdown");
            break;
        }
        let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
        engine.collect(&mut guard.registry, economy, sink, id, now, &mut summary);
    }
    summary
}

/// Run dirty-gated saves until shutdown.
///
/// The final flush on the shutdown path happens in `main` after every
/// other task has stopped; this loop only covers the steady state.
pub async fn persistence_loop(
    state: Arc<RwLock<EngineState>>,
    coordinator: Arc<PersistenceCoordinator>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                flush_once(&state, &coordinator);
            }
            _ = shutdown.changed() => {
                info!("persistence task stopping");
                return;
            }
        }
    }
}

/// Flush whatever is dirty without holding the state lock across disk
/// I/O.
///
/// Snapshots and change counters are captured under a short read lock,
/// the write runs with no lock held, and a short write lock afterwards
/// commits the save at the captured counter. Mutations that land while
/// the write is in flight keep the state dirty for the next cycle, and
/// so does a failed write.
pub fn flush_once(state: &Arc<RwLock<EngineState>>, coordinator: &PersistenceCoordinator) {
    let (estates, requests) = {
        let guard = state.read().unwrap_or_else(PoisonError::into_inner);
        let estates = guard.registry.is_dirty().then(|| {
            let snapshot: Vec<_> = guard.registry.estates().cloned().collect();
            (snapshot, guard.registry.generation())
        });
        let requests = guard
            .queue
            .is_dirty()
            .then(|| (guard.queue.snapshot(), guard.queue.generation()));
        (estates, requests)
    };

    if let Some((snapshot, generation)) = estates {
        match coordinator.save_estates(&snapshot) {
            Ok(()) => {
                let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
                guard.registry.mark_saved(generation);
            }
            Err(e) => warn!(error = %e, "estate flush failed, retrying next cycle"),
        }
    }

    if let Some((snapshot, generation)) = requests {
        match coordinator.save_requests(&snapshot) {
            Ok(()) => {
                let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
                guard.queue.mark_saved(generation);
            }
            Err(e) => warn!(error = %e, "expansion request flush failed, retrying next cycle"),
        }
    }
}

/// Listen for ban signals and purge the banned account's estates.
pub async fn ban_listener(
    state: Arc<RwLock<EngineState>>,
    mut signals: mpsc::Receiver<AccountId>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            signal = signals.recv() => {
                let Some(account) = signal else {
                    info!("ban signal channel closed");
                    return;
                };
                let removed = {
                    let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
                    purge(&mut guard.registry, account)
                };
                info!(account = %account, removed, "processed ban signal");
            }
            _ = shutdown.changed() => {
                info!("ban listener stopping");
                return;
            }
        }
    }
}
