//! squall-core — message catalog, fingerprints, configuration, and the
//! network collaborator boundary shared by the engine and the daemon.

pub mod catalog;
pub mod config;
pub mod fingerprint;
pub mod net;

pub use catalog::{MessageKind, KIND_MAX};
pub use config::SquallConfig;
pub use fingerprint::{fingerprint, Fingerprint};
pub use net::{NetMetrics, Network, PeerId, SendTarget};
