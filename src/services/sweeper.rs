//! Wizard sweeper: background eviction of abandoned booking wizards.
//!
//! DESIGN
//! ======
//! A wizard normally leaves the registry when the client closes it. Tabs
//! that vanish never send that close, so a background task periodically
//! drops wizards idle for longer than the configured TTL. A busy wizard gets
//! a longer ceiling (`BUSY_TTL_FACTOR` times the TTL) so a slow external
//! call can still settle, but one whose settle never arrives is dropped too.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::wizard::BookingWizard;
use crate::state::AppState;

/// Lower bound on the sweep period so short TTLs do not spin.
const MIN_SWEEP_INTERVAL_SECS: u64 = 5;

/// Busy wizards may idle this many TTLs before eviction.
const BUSY_TTL_FACTOR: u32 = 2;

/// Remove wizards idle longer than `ttl`, or longer than `busy_ttl` while a
/// request is in flight. Returns the evicted IDs.
pub fn evict_idle(wizards: &mut HashMap<Uuid, BookingWizard>, ttl: Duration, busy_ttl: Duration) -> Vec<Uuid> {
    let expired: Vec<Uuid> = wizards
        .values()
        .filter(|w| {
            if w.is_busy() {
                w.idle_for() > busy_ttl
            } else {
                w.idle_for() > ttl
            }
        })
        .map(|w| w.id)
        .collect();
    for id in &expired {
        if let Some(w) = wizards.remove(id) {
            if w.is_busy() {
                warn!(wizard_id = %id, step = %w.step(), "evicting booking wizard stuck in flight");
            }
        }
    }
    expired
}

/// Spawn the sweeper. Returns a handle for shutdown.
pub fn spawn_wizard_sweeper(state: AppState) -> JoinHandle<()> {
    let ttl = Duration::from_secs(state.config.wizard_ttl_secs);
    let busy_ttl = ttl * BUSY_TTL_FACTOR;
    let period = Duration::from_secs((state.config.wizard_ttl_secs / 4).max(MIN_SWEEP_INTERVAL_SECS));
    info!(ttl_secs = ttl.as_secs(), period_secs = period.as_secs(), "booking wizard sweeper configured");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = evict_idle(&mut *state.wizards.write().await, ttl, busy_ttl);
            if evicted.is_empty() {
                debug!("wizard sweep: nothing idle");
            } else {
                info!(count = evicted.len(), "evicted idle booking wizards");
            }
        }
    })
}

#[cfg(test)]
#[path = "sweeper_test.rs"]
mod tests;
