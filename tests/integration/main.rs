//! Squall integration test harness.
//!
//! Wires the full engine — dedup, relay workers, load controller, stats,
//! clock — over the in-memory loopback transport and drives it under
//! paused tokio time. Capture mode inspects exactly what went out; echo
//! mode feeds deliveries back in as inbound gossip so the dedup and waste
//! accounting paths get exercised end to end.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use squall_core::config::{ClockConfig, LoadConfig};
use squall_core::{MessageKind, Network, PeerId};
use squall_engine::{
    memnet::simulated_peers, DedupCache, LoadController, LoopbackNet, RelayEngine, SimClock,
    StatsAggregator, SyntheticGenerator,
};

mod load_flow;
mod relay_flow;

// ── Harness ───────────────────────────────────────────────────────────────────

pub struct TestEngine {
    pub net: Arc<LoopbackNet>,
    pub stats: StatsAggregator,
    pub load: Arc<LoadController>,
    pub clock: SimClock,
    /// Feed inbound messages as if the transport read them.
    pub inbound_tx: mpsc::UnboundedSender<(PeerId, Bytes)>,
}

pub fn engine(echo: bool, load_cfg: LoadConfig, clock_cfg: ClockConfig) -> TestEngine {
    let peers = simulated_peers(8);
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let net = Arc::new(if echo {
        LoopbackNet::with_echo(peers, inbound_tx.clone())
    } else {
        LoopbackNet::capture(peers)
    });
    let net_dyn: Arc<dyn Network> = net.clone();

    let generating = Arc::new(AtomicBool::new(false));
    let generator = Arc::new(SyntheticGenerator::with_default_mix());
    let stats = StatsAggregator::new();
    stats.spawn_rate_task();
    let clock = SimClock::new();

    let relay = Arc::new(RelayEngine::new(
        DedupCache::new(Duration::from_secs(60), 10),
        generator.clone(),
        stats.clone(),
        net_dyn.clone(),
        generating.clone(),
        load_cfg.missing_msg_probability,
    ));
    relay.spawn_workers(4, inbound_rx);

    let load = Arc::new(LoadController::new(
        net_dyn,
        generator,
        stats.clone(),
        generating,
        load_cfg,
    ));
    load.spawn_clock(clock.clone(), clock_cfg);

    TestEngine {
        net,
        stats,
        load,
        clock,
        inbound_tx,
    }
}

/// A raw wire message: kind tag first, deterministic filler after.
pub fn raw(kind: MessageKind, filler: u8) -> Bytes {
    let mut buf = vec![filler; kind.avg_size()];
    buf[0] = kind.tag();
    Bytes::from(buf)
}

/// Let the worker pool drain what we just queued.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
    tokio::task::yield_now().await;
}
