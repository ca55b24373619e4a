//! squall-engine — the traffic engine proper.
//!
//! Four tightly coupled pieces: a time-rotating dedup cache, a weighted
//! synthetic-message generator, the per-kind relay decision table, and a
//! rate-ramping load controller, observed by a shared stats aggregator.
//! Everything is wired over the [`squall_core::Network`] boundary; the
//! in-memory loopback net here serves tests and the demo daemon.

pub mod clock;
pub mod dedup;
pub mod generator;
pub mod load;
pub mod memnet;
pub mod recorder;
pub mod relay;
pub mod stats;

pub use clock::SimClock;
pub use dedup::DedupCache;
pub use generator::SyntheticGenerator;
pub use load::LoadController;
pub use memnet::LoopbackNet;
pub use recorder::StatsRecorder;
pub use relay::RelayEngine;
pub use stats::{StatsAggregator, StatsSnapshot};
