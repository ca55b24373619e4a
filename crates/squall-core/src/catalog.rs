//! Message catalog — the twelve gossip message kinds, their display names,
//! and their average payload sizes.
//!
//! Sizes and the default synthetic mix are calibrated from 68 hours of
//! observed production traffic. They matter only for sizing synthetic
//! payloads realistically; content beyond the one-byte tag is opaque.

use serde::{Deserialize, Serialize};

/// Message kind discriminator. The first byte of every wire message.
/// Tag 0 is reserved as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    Ack = 1,
    Eom = 2,
    Heartbeat = 3,
    CommitChain = 4,
    CommitEntry = 5,
    RevealEntry = 6,
    BlockSig = 7,
    Transaction = 8,
    MissingMsg = 9,
    MissingReply = 10,
    StateRequest = 11,
    StateReply = 12,
}

/// Number of per-kind counter slots: tags 1..=12 plus slot 0 for
/// unrecognized tags.
pub const KIND_MAX: usize = 13;

impl MessageKind {
    pub const ALL: [MessageKind; 12] = [
        Self::Ack,
        Self::Eom,
        Self::Heartbeat,
        Self::CommitChain,
        Self::CommitEntry,
        Self::RevealEntry,
        Self::BlockSig,
        Self::Transaction,
        Self::MissingMsg,
        Self::MissingReply,
        Self::StateRequest,
        Self::StateReply,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Ack),
            2 => Some(Self::Eom),
            3 => Some(Self::Heartbeat),
            4 => Some(Self::CommitChain),
            5 => Some(Self::CommitEntry),
            6 => Some(Self::RevealEntry),
            7 => Some(Self::BlockSig),
            8 => Some(Self::Transaction),
            9 => Some(Self::MissingMsg),
            10 => Some(Self::MissingReply),
            11 => Some(Self::StateRequest),
            12 => Some(Self::StateReply),
            _ => None,
        }
    }

    /// The wire tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ack => "ACK",
            Self::Eom => "EOM",
            Self::Heartbeat => "Heartbeat",
            Self::CommitChain => "CommitChain",
            Self::CommitEntry => "CommitEntry",
            Self::RevealEntry => "RevealEntry",
            Self::BlockSig => "BlockSig",
            Self::Transaction => "Transaction",
            Self::MissingMsg => "MissingMsg",
            Self::MissingReply => "MissingReply",
            Self::StateRequest => "StateRequest",
            Self::StateReply => "StateReply",
        }
    }

    /// Display name for a raw tag, including unrecognized ones.
    pub fn name_of(tag: u8) -> &'static str {
        match Self::from_u8(tag) {
            Some(kind) => kind.name(),
            None => "UNKNOWN",
        }
    }

    /// Average observed payload size in bytes. Synthetic messages of this
    /// kind are emitted at exactly this size.
    pub fn avg_size(self) -> usize {
        match self {
            Self::Ack => 256,
            Self::Eom => 179,
            Self::Heartbeat => 175,
            Self::CommitChain => 201,
            Self::CommitEntry => 137,
            Self::RevealEntry => 538,
            Self::BlockSig => 385,
            Self::Transaction => 250,
            Self::MissingMsg => 56,
            Self::MissingReply => 538,
            Self::StateRequest => 15,
            Self::StateReply => 785,
        }
    }
}

/// Observed makeup of entry-bearing traffic: commits to chains vs entries
/// vs plain transactions. Feeds the generator's weight table.
pub fn default_mix() -> Vec<(MessageKind, f64)> {
    vec![
        (MessageKind::CommitChain, 0.0076831142222981),
        (MessageKind::Transaction, 0.0012975926242103),
        (MessageKind::CommitEntry, 0.9910192931534915),
    ]
}
