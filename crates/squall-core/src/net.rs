//! Network collaborator boundary.
//!
//! The actual transport (handshake, discovery, connection management) lives
//! outside this workspace. The engine only needs to hand it outbound
//! messages with a delivery target, enumerate peers, and read its byte
//! counters. Inbound messages arrive on an mpsc channel created at wiring
//! time.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub type PeerId = String;

/// Target selector for outbound delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SendTarget {
    /// Every connected peer.
    Broadcast,

    /// A transport-chosen subset of peers (gossip fanout).
    #[default]
    Subset,

    /// One randomly chosen peer.
    Random,

    /// A specific peer.
    #[serde(rename = "peer")]
    Peer { peer: PeerId },
}

/// Transport-level byte and message counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NetMetrics {
    pub bytes_down: u64,
    pub bytes_up: u64,
    pub messages_down: u64,
    pub messages_up: u64,
}

/// Outbound half of the transport, plus peer enumeration and counters.
///
/// Intentionally minimal. `deliver` is fire-and-forget — transports queue
/// internally and own their failure handling; the engine never retries.
pub trait Network: Send + Sync + 'static {
    fn deliver(&self, target: SendTarget, payload: Bytes);

    fn peers(&self) -> Vec<PeerId>;

    fn metrics(&self) -> NetMetrics;
}
