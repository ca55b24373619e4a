//! Per-second telemetry recording.
//!
//! Appends one CSV line per second: rates, rolling accumulators, and the
//! transport byte counters. Started at most once per process via an atomic
//! flag; later calls are no-ops so a restarted load run never truncates an
//! in-progress recording.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use squall_core::Network;

use crate::StatsAggregator;

#[derive(Clone)]
pub struct StatsRecorder {
    started: Arc<AtomicBool>,
    stats: StatsAggregator,
    net: Arc<dyn Network>,
    path: PathBuf,
}

impl StatsRecorder {
    pub fn new(stats: StatsAggregator, net: Arc<dyn Network>, path: PathBuf) -> Self {
        Self {
            started: Arc::new(AtomicBool::new(false)),
            stats,
            net,
            path,
        }
    }

    /// Begin recording. Only the first call has any effect.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let recorder = self.clone();
        tokio::spawn(async move {
            if let Err(e) = recorder.record().await {
                tracing::error!(error = %e, path = %recorder.path.display(), "telemetry recording failed");
            }
        });
    }

    async fn record(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut file = std::fs::File::create(&self.path)
            .with_context(|| format!("failed to create {}", self.path.display()))?;

        writeln!(file, "# recording session started {}", unix_now())?;
        writeln!(
            file,
            "unix,eps,eps_accum,tps,tps_accum,bytes_down,bytes_up,messages_down,messages_up"
        )?;
        tracing::info!(path = %self.path.display(), "telemetry recording started");

        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (eps, eps_accum, tps, tps_accum) = self.stats.rate_line();
            let m = self.net.metrics();
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{}",
                unix_now(),
                eps,
                eps_accum,
                tps,
                tps_accum,
                m.bytes_down,
                m.bytes_up,
                m.messages_down,
                m.messages_up
            )?;
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
