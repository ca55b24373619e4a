//! Synthetic message generation.
//!
//! Two independent jobs: pick a message kind by weighted random sampling,
//! and build a realistically sized payload for a kind. Weights are relative
//! and need not sum to 1; the table is built once and immutable after.

use bytes::Bytes;
use rand::{Rng, RngCore};

use squall_core::MessageKind;

pub struct SyntheticGenerator {
    /// (kind, cumulative weight), ascending.
    table: Vec<(MessageKind, f64)>,
    total: f64,
}

impl SyntheticGenerator {
    /// Build the cumulative weight table. Negative weights are rejected.
    pub fn new(weights: &[(MessageKind, f64)]) -> Self {
        assert!(!weights.is_empty(), "generator needs at least one kind");
        let mut table = Vec::with_capacity(weights.len());
        let mut sum = 0.0;
        for &(kind, w) in weights {
            assert!(w >= 0.0, "negative weight for {}", kind.name());
            sum += w;
            table.push((kind, sum));
        }
        table.sort_by(|a, b| a.1.total_cmp(&b.1));
        Self { table, total: sum }
    }

    /// Generator over the observed production traffic mix.
    pub fn with_default_mix() -> Self {
        Self::new(&squall_core::catalog::default_mix())
    }

    /// Draw a kind proportional to its configured weight.
    ///
    /// Uniform draw in [0, total); first table entry whose cumulative
    /// weight exceeds the draw wins. Float rounding can leave no match;
    /// the last entry is the defined fallback.
    pub fn weighted_pick(&self) -> MessageKind {
        let r = rand::thread_rng().gen::<f64>() * self.total;
        for &(kind, cumulative) in &self.table {
            if r < cumulative {
                return kind;
            }
        }
        self.table[self.table.len() - 1].0
    }

    /// Build a payload of the kind's average observed size: tag byte first,
    /// random filler after. Only identity and size matter downstream.
    pub fn create_message(&self, kind: MessageKind) -> Bytes {
        let mut buf = vec![0u8; kind.avg_size()];
        rand::thread_rng().fill_bytes(&mut buf);
        buf[0] = kind.tag();
        Bytes::from(buf)
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }
}
