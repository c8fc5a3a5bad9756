//! Chunkserver liveness tracking and heartbeat monitoring
//!
//! Two execution contexts share the table:
//! - the heartbeat receiver, invoked concurrently per incoming heartbeat,
//!   mutates only the current timestamps;
//! - the background monitor, the sole mutator of previous timestamps and
//!   presence state, sweeps the table on a fixed interval.
//!
//! A chunkserver is alive iff its current timestamp advanced since the
//! last sweep.

use crate::common::timestamp_now_millis;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Presence of one chunkserver as of the last sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Never reported
    Unknown,
    /// Reported since the last sweep
    Present,
    /// No new report since the last sweep
    Absent,
}

/// Result of one monitor sweep.
#[derive(Debug, Clone)]
pub struct Sweep {
    /// Ids that transitioned to (or stayed) absent this cycle
    pub absent: Vec<String>,
    /// Full presence vector, id → reported-since-last-sweep
    pub presence: HashMap<String, bool>,
}

impl Sweep {
    pub fn needs_recovery(&self) -> bool {
        !self.absent.is_empty()
    }
}

struct Inner {
    current: HashMap<String, u64>,
    previous: HashMap<String, u64>,
    presence: HashMap<String, Presence>,
    activated: bool,
}

/// Liveness table keyed by chunkserver id.
///
/// Membership is dynamic: ids are adopted as they first report. Configured
/// ids that never report are seeded with a zero timestamp once the first
/// heartbeat activates storage, so they show up absent instead of being
/// silently ignored.
pub struct LivenessTable {
    expected: Vec<String>,
    inner: Mutex<Inner>,
}

impl LivenessTable {
    pub fn new(expected: Vec<String>) -> Self {
        Self {
            expected,
            inner: Mutex::new(Inner {
                current: HashMap::new(),
                previous: HashMap::new(),
                presence: HashMap::new(),
                activated: false,
            }),
        }
    }

    /// Record a heartbeat from `id`. Safe to call concurrently.
    pub fn record(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.activated {
            inner.activated = true;
            for expected in &self.expected {
                inner.previous.entry(expected.clone()).or_insert(0);
                inner
                    .presence
                    .entry(expected.clone())
                    .or_insert(Presence::Unknown);
            }
        }
        inner.current.insert(id.to_string(), timestamp_now_millis());
    }

    /// Presence of `id` as of the last sweep.
    pub fn presence(&self, id: &str) -> Presence {
        self.inner
            .lock()
            .unwrap()
            .presence
            .get(id)
            .copied()
            .unwrap_or(Presence::Unknown)
    }

    /// Has any chunkserver reported yet?
    pub fn activated(&self) -> bool {
        self.inner.lock().unwrap().activated
    }

    /// One monitor cycle: compare current timestamps against the previous
    /// sweep, update presence, and advance the previous timestamps of
    /// nodes that reported. Called only by the monitor.
    pub fn sweep(&self) -> Sweep {
        let mut inner = self.inner.lock().unwrap();
        let mut absent = Vec::new();
        let mut presence_vec = HashMap::new();

        if !inner.activated {
            return Sweep {
                absent,
                presence: presence_vec,
            };
        }

        // Adopt ids reporting for the first time.
        let newcomers: Vec<(String, u64)> = inner
            .current
            .iter()
            .filter(|(id, _)| !inner.previous.contains_key(*id))
            .map(|(id, ts)| (id.clone(), *ts))
            .collect();

        let tracked: Vec<String> = inner.previous.keys().cloned().collect();
        for id in tracked {
            let prev = inner.previous[&id];
            match inner.current.get(&id).copied() {
                Some(cur) if cur != prev => {
                    inner.presence.insert(id.clone(), Presence::Present);
                    inner.previous.insert(id.clone(), cur);
                    presence_vec.insert(id, true);
                }
                _ => {
                    inner.presence.insert(id.clone(), Presence::Absent);
                    presence_vec.insert(id.clone(), false);
                    absent.push(id);
                }
            }
        }

        for (id, ts) in newcomers {
            inner.presence.insert(id.clone(), Presence::Present);
            inner.previous.insert(id.clone(), ts);
            presence_vec.insert(id, true);
        }

        Sweep {
            absent,
            presence: presence_vec,
        }
    }
}

/// External recovery routine, invoked with the full presence vector when
/// any chunkserver goes absent. Responsible for reconstructing lost shards
/// from the survivors and redistributing them.
pub trait RecoveryHandler: Send + Sync {
    fn recover(&self, presence: &HashMap<String, bool>);
}

/// Recovery handler that only logs. Stands in where no recovery machinery
/// is wired up.
pub struct LogOnlyRecovery;

impl RecoveryHandler for LogOnlyRecovery {
    fn recover(&self, presence: &HashMap<String, bool>) {
        let missing: Vec<&str> = presence
            .iter()
            .filter(|(_, present)| !**present)
            .map(|(id, _)| id.as_str())
            .collect();
        tracing::warn!(?missing, "recovery requested, no handler configured");
    }
}

/// Spawn the heartbeat monitor.
///
/// Runs for the lifetime of the master, re-evaluating every cycle whether
/// or not a recovery was triggered in a prior one.
pub fn start_monitor(
    table: Arc<LivenessTable>,
    interval: Duration,
    recovery: Arc<dyn RecoveryHandler>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tracing::debug!("checking last heartbeat");
            let sweep = table.sweep();
            if sweep.needs_recovery() {
                tracing::warn!(absent = ?sweep.absent, "chunkserver heartbeat timeout");
                recovery.recover(&sweep.presence);
            }
        }
    })
}
