use crate::*;

use bytes::Bytes;
use squall_core::config::{ClockConfig, LoadConfig};
use squall_core::{MessageKind, SendTarget};

#[tokio::test(start_paused = true)]
async fn inbound_gossip_flows_through_the_worker_pool() {
    let eng = engine(false, LoadConfig::default(), ClockConfig::default());

    for i in 0..10u8 {
        eng.inbound_tx
            .send(("peer-01".to_string(), raw(MessageKind::CommitEntry, i)))
            .unwrap();
    }
    // one of them twice, from a different peer
    eng.inbound_tx
        .send(("peer-02".to_string(), raw(MessageKind::CommitEntry, 3)))
        .unwrap();
    settle().await;

    let snap = eng.stats.snapshot(Some(eng.net.as_ref()));
    let ce = snap.kinds.iter().find(|k| k.name == "CommitEntry").unwrap();
    assert_eq!(ce.received, 11);
    assert_eq!(ce.received_non_duplicate, 10);
    assert_eq!(ce.sent, 10, "only first sightings are rebroadcast");
    assert!((eng.stats.waste(MessageKind::CommitEntry) - 10.0 / 11.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn request_reply_round_trip() {
    let eng = engine(false, LoadConfig::default(), ClockConfig::default());

    eng.inbound_tx
        .send(("peer-05".to_string(), raw(MessageKind::MissingMsg, 1)))
        .unwrap();
    eng.inbound_tx
        .send(("peer-06".to_string(), raw(MessageKind::StateRequest, 2)))
        .unwrap();
    settle().await;

    let sent = eng.net.take_sent();
    assert_eq!(sent.len(), 4, "two rebroadcasts, two direct replies");

    let replies: Vec<_> = sent
        .iter()
        .filter(|(t, _)| matches!(t, SendTarget::Peer { .. }))
        .collect();
    assert_eq!(replies.len(), 2);
    for (target, payload) in replies {
        match (target, payload[0]) {
            (SendTarget::Peer { peer }, tag) if tag == MessageKind::MissingReply.tag() => {
                assert_eq!(peer, "peer-05")
            }
            (SendTarget::Peer { peer }, tag) if tag == MessageKind::StateReply.tag() => {
                assert_eq!(peer, "peer-06")
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn echoed_rebroadcasts_come_back_as_duplicates() {
    let eng = engine(true, LoadConfig::default(), ClockConfig::default());

    // seed one message; the rebroadcast echoes back and must be suppressed
    eng.inbound_tx
        .send(("peer-00".to_string(), raw(MessageKind::Transaction, 9)))
        .unwrap();
    settle().await;

    let snap = eng.stats.snapshot(Some(eng.net.as_ref()));
    let tx = snap.kinds.iter().find(|k| k.name == "Transaction").unwrap();
    assert_eq!(tx.received, 2, "original plus its echoed rebroadcast");
    assert_eq!(tx.received_non_duplicate, 1);
    assert_eq!(tx.sent, 1, "the echo is never relayed again");
}

#[tokio::test(start_paused = true)]
async fn garbage_inbound_is_contained() {
    let eng = engine(false, LoadConfig::default(), ClockConfig::default());

    eng.inbound_tx
        .send(("peer-00".to_string(), Bytes::new()))
        .unwrap();
    eng.inbound_tx
        .send(("peer-00".to_string(), Bytes::from_static(&[0xFF, 0, 0])))
        .unwrap();
    settle().await;

    assert!(eng.net.take_sent().is_empty());
    let snap = eng.stats.snapshot(None);
    assert_eq!(snap.unrecognized_received, 1, "empty message is not counted");
}
