//! squalld — Squall synthetic-traffic daemon.
//!
//! Runs the full engine against the in-memory loopback transport: relayed
//! and synthesized traffic echoes back in as inbound gossip, so the daemon
//! exercises dedup, relay, and load shaping self-contained. A real
//! transport plugs in at the same `Network` boundary.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tokio::sync::mpsc;

use squall_core::config::data_dir;
use squall_core::{Network, SquallConfig};
use squall_engine::{
    memnet::simulated_peers, DedupCache, LoadController, LoopbackNet, RelayEngine, SimClock,
    StatsAggregator, StatsRecorder, SyntheticGenerator,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = SquallConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = SquallConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        SquallConfig::default()
    });
    tracing::info!(
        workers = config.relay.workers,
        peers = config.relay.simulated_peers,
        buckets = config.dedup.buckets,
        "squalld starting"
    );

    // Inbound channel + loopback transport
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let net: Arc<LoopbackNet> = Arc::new(LoopbackNet::with_echo(
        simulated_peers(config.relay.simulated_peers),
        inbound_tx,
    ));
    let net_dyn: Arc<dyn Network> = net.clone();

    // Shared engine state
    let generating = Arc::new(AtomicBool::new(false));
    let generator = Arc::new(SyntheticGenerator::with_default_mix());
    let stats = StatsAggregator::new();
    let _rate_task = stats.spawn_rate_task();
    let dedup = DedupCache::new(
        Duration::from_secs(config.dedup.rotation_secs),
        config.dedup.buckets,
    );
    let clock = SimClock::new();

    // Relay worker pool
    let relay = Arc::new(RelayEngine::new(
        dedup,
        generator.clone(),
        stats.clone(),
        net_dyn.clone(),
        generating.clone(),
        config.load.missing_msg_probability,
    ));
    let worker_tasks = relay.spawn_workers(config.relay.workers.max(1), inbound_rx);
    tracing::info!(count = worker_tasks.len(), "relay workers running");

    // Load controller with telemetry recording
    let recording_path = if config.recording.path.as_os_str().is_empty() {
        data_dir()
    } else {
        config.recording.path.clone()
    }
    .join(format!("run-{}.csv", unix_now()));
    let recorder = StatsRecorder::new(stats.clone(), net_dyn.clone(), recording_path);

    let load = Arc::new(
        LoadController::new(
            net_dyn.clone(),
            generator,
            stats.clone(),
            generating,
            config.load.clone(),
        )
        .with_recorder(recorder),
    );
    let _clock_task = load.spawn_clock(clock.clone(), config.clock.clone());

    if config.load.autostart_eps > 0 {
        load.apply_load(
            true,
            config.load.autostart_eps,
            config.load.autostart_feds,
            config.load.autostart_audits,
        );
    }

    // Periodic snapshot logging
    let snapshot_printer = {
        let stats = stats.clone();
        let net = net_dyn.clone();
        let clock = clock.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(10));
            loop {
                interval.tick().await;
                let snap = stats.snapshot(Some(net.as_ref()));
                let pos = clock.position();
                tracing::info!(
                    height = pos.height,
                    minute = pos.minute,
                    eps = snap.eps,
                    tps = snap.tps,
                    messages_up = snap.net.messages_up,
                    messages_down = snap.net.messages_down,
                    "stats snapshot"
                );
                match serde_json::to_string(&snap) {
                    Ok(json) => tracing::debug!(%json, "full snapshot"),
                    Err(e) => tracing::warn!(error = %e, "snapshot serialization failed"),
                }
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown signal received"),
        r = snapshot_printer => tracing::error!("snapshot printer exited: {:?}", r),
    }

    load.apply_load(false, 0, 0, 0);
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
