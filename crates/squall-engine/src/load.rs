//! Load controller — shapes outbound synthetic traffic over time.
//!
//! `apply_load` is the single mutating entry point. Enabling starts one
//! emission task that ramps from a floor rate up to the target in fixed
//! steps, then holds. At most one emission task is ever alive: starting
//! always cancels the previous task's token first, and cancellation is
//! checked once per tick. Rate shaping works on a fine-grained tick with a
//! fractional-remainder accumulator, so the average matches the target
//! without sub-millisecond scheduling.
//!
//! Independently, a minute ticker advances the simulation clock and, while
//! generating, seeds end-of-minute traffic: EOMs to the federated
//! participants and heartbeats to the auditors, with a block signature (and
//! usually a state request) substituted at each block boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use squall_core::config::{ClockConfig, LoadConfig};
use squall_core::{MessageKind, Network, SendTarget};

use crate::{SimClock, StatsAggregator, StatsRecorder, SyntheticGenerator};

#[derive(Default)]
struct RampState {
    eps: u64,
    feds: u32,
    audits: u32,
    cancel: Option<CancellationToken>,
}

pub struct LoadController {
    net: Arc<dyn Network>,
    gen: Arc<SyntheticGenerator>,
    stats: StatsAggregator,
    /// Shared with the relay engine's ACK feedback gate.
    generating: Arc<AtomicBool>,
    ramp: Mutex<RampState>,
    cfg: LoadConfig,
    recorder: Option<StatsRecorder>,
}

impl LoadController {
    pub fn new(
        net: Arc<dyn Network>,
        gen: Arc<SyntheticGenerator>,
        stats: StatsAggregator,
        generating: Arc<AtomicBool>,
        cfg: LoadConfig,
    ) -> Self {
        Self {
            net,
            gen,
            stats,
            generating,
            ramp: Mutex::new(RampState::default()),
            cfg,
            recorder: None,
        }
    }

    /// Attach a telemetry recorder, started on the first enable.
    pub fn with_recorder(mut self, recorder: StatsRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// The single mutating control entry point.
    ///
    /// Disable cancels the in-flight emission task. Enable while already
    /// enabled is rejected so two ramps can never overlap; supersede an
    /// active rate by disabling first. Targets below the configured
    /// minimum are ignored.
    pub fn apply_load(self: &Arc<Self>, enabled: bool, eps: u64, feds: u32, audits: u32) {
        let mut ramp = self.ramp.lock().unwrap_or_else(|e| e.into_inner());

        if !enabled {
            self.generating.store(false, Ordering::SeqCst);
            if let Some(token) = ramp.cancel.take() {
                token.cancel();
            }
            tracing::info!("load generation disabled");
            return;
        }

        if self.generating.load(Ordering::SeqCst) {
            tracing::error!("load generation already running");
            return;
        }
        if eps < self.cfg.min_eps {
            tracing::info!(eps, min_eps = self.cfg.min_eps, "target below minimum, ignoring");
            return;
        }

        ramp.eps = eps;
        ramp.feds = feds;
        ramp.audits = audits;

        // cancel-then-start: no tick after this point can emit at a
        // superseded rate
        if let Some(token) = ramp.cancel.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        ramp.cancel = Some(token.clone());
        self.generating.store(true, Ordering::SeqCst);
        drop(ramp);

        if let Some(recorder) = &self.recorder {
            recorder.start();
        }

        tracing::info!(eps, feds, audits, "load generator ramping up");
        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_emission(eps, token).await;
        });
    }

    /// Current control settings: (enabled, target eps, feds, audits).
    pub fn settings(&self) -> (bool, u64, u32, u32) {
        let ramp = self.ramp.lock().unwrap_or_else(|e| e.into_inner());
        (
            self.generating.load(Ordering::SeqCst),
            ramp.eps,
            ramp.feds,
            ramp.audits,
        )
    }

    /// Start the minute ticker driving the simulation clock and the
    /// end-of-minute traffic.
    pub fn spawn_clock(self: &Arc<Self>, clock: SimClock, cfg: ClockConfig) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(cfg.minute_secs.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let pos = clock.advance(cfg.minutes_per_block.max(1));
                tracing::debug!(height = pos.height, minute = pos.minute, "minute boundary");
                if controller.generating.load(Ordering::SeqCst) {
                    controller.send_end_of_minute(pos.minute);
                }
            }
        })
    }

    async fn run_emission(self: Arc<Self>, target: u64, token: CancellationToken) {
        let target = target.max(1);
        let tick_millis = self.cfg.tick_millis.max(1);
        let ticks_per_sec = 1000.0 / tick_millis as f64;

        let mut rate = self.cfg.ramp_floor.clamp(1, target);
        let mut per_tick = rate as f64 / ticks_per_sec;
        let mut ramp_done = rate >= target;
        let mut accumulator = 0.0f64;

        let mut tick = tokio::time::interval(Duration::from_millis(tick_millis));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut step =
            tokio::time::interval(Duration::from_secs(self.cfg.ramp_period_secs.max(1)));
        step.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // both fire immediately on first poll
        tick.tick().await;
        step.tick().await;

        tracing::info!(eps = rate, target, per_tick, "starting load emission");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(eps = rate, "ending load emission");
                    return;
                }

                _ = tick.tick() => {
                    let burst = per_tick as u64;
                    for _ in 0..burst {
                        self.send_randomized();
                    }
                    accumulator += per_tick.fract();
                    if accumulator > 1.0 {
                        accumulator -= 1.0;
                        self.send_randomized();
                    }
                }

                _ = step.tick(), if !ramp_done => {
                    rate = (rate + self.cfg.ramp_step.max(1)).min(target);
                    per_tick = rate as f64 / ticks_per_sec;
                    if rate >= target {
                        ramp_done = true;
                        tracing::info!(eps = rate, "ramp complete, holding");
                    } else {
                        tracing::info!(eps = rate, "ramp step");
                    }
                }
            }
        }
    }

    /// One synthetic event: a weighted-picked message and its ACK, plus a
    /// reveal/ACK pair for anything that was a commit (two-phase
    /// commit/reveal handshake).
    fn send_randomized(&self) {
        let kind = self.gen.weighted_pick();
        self.emit(kind);
        self.emit(MessageKind::Ack);

        if kind != MessageKind::Transaction {
            self.emit(MessageKind::RevealEntry);
            self.emit(MessageKind::Ack);
        }
    }

    fn emit(&self, kind: MessageKind) {
        self.net
            .deliver(SendTarget::Random, self.gen.create_message(kind));
        self.stats.add_sent(kind, 1);
    }

    fn send_end_of_minute(&self, minute: u32) {
        let (feds, audits) = {
            let ramp = self.ramp.lock().unwrap_or_else(|e| e.into_inner());
            (ramp.feds, ramp.audits)
        };

        // block boundary swaps the EOM for a block signature
        let kind = if minute == 0 {
            MessageKind::BlockSig
        } else {
            MessageKind::Eom
        };
        for _ in 0..feds {
            self.emit(kind);
        }
        for _ in 0..audits {
            self.emit(MessageKind::Heartbeat);
        }

        if minute == 0
            && rand::thread_rng().gen::<f64>() < self.cfg.state_request_probability
        {
            self.emit(MessageKind::StateRequest);
        }
    }
}
