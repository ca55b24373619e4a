//! Inbound relay — the per-kind decision table applied to every message
//! the network hands us.
//!
//! Duplicates are dropped outright. First-seen traffic is rebroadcast to a
//! peer subset; the two request kinds additionally get a synthesized reply
//! sent straight back to the originator; the two reply kinds are terminal
//! so reply storms cannot loop. A fixed pool of workers pulls from one
//! shared inbound channel, so each message is handled exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use squall_core::{fingerprint, MessageKind, Network, PeerId, SendTarget};

use crate::{DedupCache, StatsAggregator, SyntheticGenerator};

pub struct RelayEngine {
    dedup: DedupCache,
    gen: Arc<SyntheticGenerator>,
    stats: StatsAggregator,
    net: Arc<dyn Network>,
    /// Shared with the load controller; gates the ACK feedback behavior.
    generating: Arc<AtomicBool>,
    /// Chance that a first-seen ACK triggers a synthesized MissingMsg.
    missing_msg_probability: f64,
}

impl RelayEngine {
    pub fn new(
        dedup: DedupCache,
        gen: Arc<SyntheticGenerator>,
        stats: StatsAggregator,
        net: Arc<dyn Network>,
        generating: Arc<AtomicBool>,
        missing_msg_probability: f64,
    ) -> Self {
        Self {
            dedup,
            gen,
            stats,
            net,
            generating,
            missing_msg_probability,
        }
    }

    /// Spawn the worker pool over a shared inbound channel.
    pub fn spawn_workers(
        self: &Arc<Self>,
        workers: usize,
        inbound: mpsc::UnboundedReceiver<(PeerId, Bytes)>,
    ) -> Vec<JoinHandle<()>> {
        let inbound = Arc::new(tokio::sync::Mutex::new(inbound));
        (0..workers)
            .map(|_| {
                let engine = self.clone();
                let inbound = inbound.clone();
                tokio::spawn(async move {
                    loop {
                        // lock only for the recv so workers interleave
                        let next = inbound.lock().await.recv().await;
                        match next {
                            Some((peer, raw)) => engine.handle(&peer, raw),
                            None => return,
                        }
                    }
                })
            })
            .collect()
    }

    /// Apply the decision table to one inbound message.
    pub fn handle(&self, peer: &PeerId, raw: Bytes) {
        if raw.is_empty() {
            tracing::warn!(%peer, "received empty message");
            return;
        }

        let tag = raw[0];
        if self.dedup.check_and_record(fingerprint(&raw)) {
            self.stats.add_received(tag, true);
            return;
        }

        let kind = MessageKind::from_u8(tag);
        let mut sent: Option<MessageKind> = None;

        match kind {
            Some(
                k @ (MessageKind::Ack
                | MessageKind::Eom
                | MessageKind::Heartbeat
                | MessageKind::CommitChain
                | MessageKind::CommitEntry
                | MessageKind::RevealEntry
                | MessageKind::BlockSig
                | MessageKind::Transaction),
            ) => {
                self.net.deliver(SendTarget::Subset, raw.clone());
                sent = Some(k);
            }
            Some(MessageKind::MissingMsg) => {
                self.net.deliver(SendTarget::Subset, raw.clone());
                self.net.deliver(
                    SendTarget::Peer { peer: peer.clone() },
                    self.gen.create_message(MessageKind::MissingReply),
                );
                sent = Some(MessageKind::MissingReply);
            }
            Some(MessageKind::StateRequest) => {
                self.net.deliver(SendTarget::Subset, raw.clone());
                self.net.deliver(
                    SendTarget::Peer { peer: peer.clone() },
                    self.gen.create_message(MessageKind::StateReply),
                );
                sent = Some(MessageKind::StateReply);
            }
            // terminal leaves; relaying replies would breed reply storms
            Some(MessageKind::MissingReply | MessageKind::StateReply) => {}
            None => {
                tracing::warn!(%peer, tag, len = raw.len(), "received message with unknown tag");
            }
        }

        self.stats.add_received(tag, false);
        if let Some(k) = sent {
            self.stats.add_sent(k, 1);
        }

        match kind {
            Some(MessageKind::CommitChain | MessageKind::CommitEntry) => {
                self.stats.add_rate_sample(0, 1)
            }
            Some(MessageKind::RevealEntry | MessageKind::Transaction) => {
                self.stats.add_rate_sample(1, 1)
            }
            _ => {}
        }

        // while generating, a fresh ACK occasionally provokes a request
        // for missing data, matching observed request rates
        if matches!(kind, Some(MessageKind::Ack))
            && self.generating.load(Ordering::Relaxed)
            && rand::thread_rng().gen::<f64>() < self.missing_msg_probability
        {
            self.net.deliver(
                SendTarget::Random,
                self.gen.create_message(MessageKind::MissingMsg),
            );
        }
    }
}
