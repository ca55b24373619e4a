//! In-memory loopback transport.
//!
//! Two modes: capture (tests inspect everything the engine delivered) and
//! echo (delivered traffic re-enters the inbound channel as if a neighbor
//! gossiped it back, which lets the demo daemon run self-contained). The
//! real wire transport lives outside this workspace.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use dashmap::DashMap;
use rand::Rng;
use tokio::sync::mpsc;

use squall_core::{NetMetrics, Network, PeerId, SendTarget};

pub struct LoopbackNet {
    peer_list: Vec<PeerId>,
    /// Full delivery log, capture mode only.
    log: Option<Mutex<Vec<(SendTarget, Bytes)>>>,
    /// Outbound message count per kind tag.
    by_kind: DashMap<u8, u64>,
    echo: Option<mpsc::UnboundedSender<(PeerId, Bytes)>>,

    bytes_up: AtomicU64,
    messages_up: AtomicU64,
    bytes_down: AtomicU64,
    messages_down: AtomicU64,
}

impl LoopbackNet {
    /// Capture mode: everything delivered is logged for inspection.
    pub fn capture(peer_list: Vec<PeerId>) -> Self {
        Self {
            peer_list,
            log: Some(Mutex::new(Vec::new())),
            by_kind: DashMap::new(),
            echo: None,
            bytes_up: AtomicU64::new(0),
            messages_up: AtomicU64::new(0),
            bytes_down: AtomicU64::new(0),
            messages_down: AtomicU64::new(0),
        }
    }

    /// Echo mode: each delivery is fed back once on the inbound channel,
    /// attributed to the targeted (or a random) peer. No log is kept.
    pub fn with_echo(peer_list: Vec<PeerId>, inbound: mpsc::UnboundedSender<(PeerId, Bytes)>) -> Self {
        Self {
            peer_list,
            log: None,
            by_kind: DashMap::new(),
            echo: Some(inbound),
            bytes_up: AtomicU64::new(0),
            messages_up: AtomicU64::new(0),
            bytes_down: AtomicU64::new(0),
            messages_down: AtomicU64::new(0),
        }
    }

    /// Drain the capture log.
    pub fn take_sent(&self) -> Vec<(SendTarget, Bytes)> {
        match &self.log {
            Some(log) => std::mem::take(&mut *log.lock().unwrap_or_else(|e| e.into_inner())),
            None => Vec::new(),
        }
    }

    /// Snapshot of the capture log without draining it.
    pub fn sent(&self) -> Vec<(SendTarget, Bytes)> {
        match &self.log {
            Some(log) => log.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            None => Vec::new(),
        }
    }

    /// Outbound count for one kind tag.
    pub fn sent_of_kind(&self, tag: u8) -> u64 {
        self.by_kind.get(&tag).map(|c| *c).unwrap_or(0)
    }

    fn echo_peer(&self, target: &SendTarget) -> Option<PeerId> {
        match target {
            SendTarget::Peer { peer } => Some(peer.clone()),
            _ if self.peer_list.is_empty() => None,
            _ => {
                let i = rand::thread_rng().gen_range(0..self.peer_list.len());
                Some(self.peer_list[i].clone())
            }
        }
    }
}

impl Network for LoopbackNet {
    fn deliver(&self, target: SendTarget, payload: Bytes) {
        self.messages_up.fetch_add(1, Ordering::Relaxed);
        self.bytes_up
            .fetch_add(payload.len() as u64, Ordering::Relaxed);
        if let Some(tag) = payload.first() {
            *self.by_kind.entry(*tag).or_insert(0) += 1;
        }

        if let Some(log) = &self.log {
            log.lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((target.clone(), payload.clone()));
        }

        if let Some(inbound) = &self.echo {
            if let Some(peer) = self.echo_peer(&target) {
                self.messages_down.fetch_add(1, Ordering::Relaxed);
                self.bytes_down
                    .fetch_add(payload.len() as u64, Ordering::Relaxed);
                // receiver gone means the engine is shutting down
                let _ = inbound.send((peer, payload));
            }
        }
    }

    fn peers(&self) -> Vec<PeerId> {
        self.peer_list.clone()
    }

    fn metrics(&self) -> NetMetrics {
        NetMetrics {
            bytes_down: self.bytes_down.load(Ordering::Relaxed),
            bytes_up: self.bytes_up.load(Ordering::Relaxed),
            messages_down: self.messages_down.load(Ordering::Relaxed),
            messages_up: self.messages_up.load(Ordering::Relaxed),
        }
    }
}

/// Synthetic peer ids for the demo daemon.
pub fn simulated_peers(count: u32) -> Vec<PeerId> {
    (0..count).map(|i| format!("peer-{i:02}")).collect()
}
