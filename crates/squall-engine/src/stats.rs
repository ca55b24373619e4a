//! Shared traffic counters.
//!
//! One mutex guards everything: per-kind received / non-duplicate / sent
//! arrays and the rolling EPS/TPS accumulators. The once-per-second swap
//! that publishes the accumulators as current rates holds the same lock as
//! the increments, so no sample is lost or double-counted across the
//! boundary.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;

use squall_core::{MessageKind, NetMetrics, Network, KIND_MAX};

#[derive(Default)]
struct StatsInner {
    received: [u64; KIND_MAX],
    non_dupe: [u64; KIND_MAX],
    sent: [u64; KIND_MAX],

    eps: u64,
    eps_accum: u64,
    tps: u64,
    tps_accum: u64,
}

/// Cloneable handle; all clones share the same counters.
#[derive(Clone)]
pub struct StatsAggregator {
    inner: Arc<Mutex<StatsInner>>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsInner::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatsInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Count an inbound message by raw tag. Unrecognized tags land in
    /// slot 0.
    pub fn add_received(&self, tag: u8, duplicate: bool) {
        let slot = Self::slot(tag);
        let mut s = self.lock();
        s.received[slot] += 1;
        if !duplicate {
            s.non_dupe[slot] += 1;
        }
    }

    pub fn add_sent(&self, kind: MessageKind, count: u64) {
        let mut s = self.lock();
        s.sent[kind.tag() as usize] += count;
    }

    /// Accumulate into the rolling one-second EPS/TPS windows.
    pub fn add_rate_sample(&self, events: u64, txs: u64) {
        let mut s = self.lock();
        s.eps_accum += events;
        s.tps_accum += txs;
    }

    /// Publish the rolling accumulators as the current rates and reset
    /// them. Called once per second by the rate task.
    pub fn tick_rates(&self) {
        let mut s = self.lock();
        s.eps = s.eps_accum;
        s.eps_accum = 0;
        s.tps = s.tps_accum;
        s.tps_accum = 0;
    }

    /// Fraction of received messages of this kind that were new.
    /// Defined as 0 when nothing of the kind was received.
    pub fn waste(&self, kind: MessageKind) -> f64 {
        let slot = kind.tag() as usize;
        let s = self.lock();
        if s.received[slot] == 0 {
            return 0.0;
        }
        s.non_dupe[slot] as f64 / s.received[slot] as f64
    }

    /// Start the once-per-second rate swap task. Exits when every handle
    /// to these stats is gone.
    pub fn spawn_rate_task(&self) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Mutex<StatsInner>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(inner) => StatsAggregator { inner }.tick_rates(),
                    None => return,
                }
            }
        })
    }

    /// Current rates plus in-flight accumulators, for the telemetry
    /// recorder.
    pub fn rate_line(&self) -> (u64, u64, u64, u64) {
        let s = self.lock();
        (s.eps, s.eps_accum, s.tps, s.tps_accum)
    }

    /// Read-only snapshot for the external reporting surface.
    pub fn snapshot(&self, net: Option<&dyn Network>) -> StatsSnapshot {
        let s = self.lock();
        let kinds = MessageKind::ALL
            .iter()
            .map(|&kind| {
                let slot = kind.tag() as usize;
                KindStats {
                    name: kind.name(),
                    received: s.received[slot],
                    received_non_duplicate: s.non_dupe[slot],
                    sent: s.sent[slot],
                    waste: if s.received[slot] == 0 {
                        0.0
                    } else {
                        s.non_dupe[slot] as f64 / s.received[slot] as f64
                    },
                }
            })
            .collect();
        StatsSnapshot {
            kinds,
            unrecognized_received: s.received[0],
            eps: s.eps,
            tps: s.tps,
            net: net.map(|n| n.metrics()).unwrap_or_default(),
        }
    }

    fn slot(tag: u8) -> usize {
        match MessageKind::from_u8(tag) {
            Some(kind) => kind.tag() as usize,
            None => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KindStats {
    pub name: &'static str,
    pub received: u64,
    pub received_non_duplicate: u64,
    pub sent: u64,
    pub waste: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub kinds: Vec<KindStats>,
    pub unrecognized_received: u64,
    pub eps: u64,
    pub tps: u64,
    pub net: NetMetrics,
}
