use crate::*;

use std::time::Duration;

use squall_core::config::{ClockConfig, LoadConfig};
use squall_core::{MessageKind, Network};

fn light_load() -> LoadConfig {
    LoadConfig {
        min_eps: 1,
        ramp_floor: 100,
        tick_millis: 100,
        ..LoadConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn generated_traffic_loops_back_through_the_relay() {
    let eng = engine(true, light_load(), ClockConfig::default());
    eng.load.apply_load(true, 100, 2, 1);

    tokio::time::sleep(Duration::from_secs(3)).await;
    tokio::task::yield_now().await;

    let snap = eng.stats.snapshot(Some(eng.net.as_ref()));
    let ce = snap.kinds.iter().find(|k| k.name == "CommitEntry").unwrap();
    assert!(ce.received > 0, "synthetic traffic echoed back in");
    assert!(
        ce.received > ce.received_non_duplicate,
        "rebroadcast echoes are recognized as duplicates"
    );
    let waste = eng.stats.waste(MessageKind::CommitEntry);
    assert!(waste > 0.0 && waste < 1.0, "waste {waste}");

    // rate counters got swapped at least once by the 1 s task
    assert!(snap.eps > 0 || snap.tps > 0, "rates never published");
    assert!(snap.net.messages_up > 0);
    assert!(snap.net.messages_down > 0);
}

#[tokio::test(start_paused = true)]
async fn disable_quiesces_the_engine() {
    let eng = engine(true, light_load(), ClockConfig::default());
    eng.load.apply_load(true, 100, 0, 0);
    tokio::time::sleep(Duration::from_secs(2)).await;

    eng.load.apply_load(false, 0, 0, 0);
    let (enabled, _, _, _) = eng.load.settings();
    assert!(!enabled);

    // drain what is still in flight, then nothing new shows up
    tokio::time::sleep(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    let before = eng.net.metrics().messages_up;
    tokio::time::sleep(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(eng.net.metrics().messages_up, before);
}

#[tokio::test(start_paused = true)]
async fn clock_position_tracks_simulated_minutes() {
    let eng = engine(
        false,
        light_load(),
        ClockConfig {
            minute_secs: 60,
            minutes_per_block: 10,
        },
    );

    assert_eq!(eng.clock.position().height, 0);
    tokio::time::sleep(Duration::from_secs(601)).await;
    let pos = eng.clock.position();
    assert_eq!(pos.height, 1);
    assert_eq!(pos.minute, 0);
}

#[tokio::test(start_paused = true)]
async fn minute_traffic_reaches_the_participants() {
    let eng = engine(
        false,
        LoadConfig {
            state_request_probability: 1.0,
            ..light_load()
        },
        ClockConfig {
            minute_secs: 60,
            minutes_per_block: 3,
        },
    );
    eng.load.apply_load(true, 100, 4, 2);

    tokio::time::sleep(Duration::from_secs(181)).await;
    // minutes 1 and 2 send EOMs, minute 3 wraps to the block boundary
    assert_eq!(eng.net.sent_of_kind(MessageKind::Eom.tag()), 8);
    assert_eq!(eng.net.sent_of_kind(MessageKind::BlockSig.tag()), 4);
    assert_eq!(eng.net.sent_of_kind(MessageKind::Heartbeat.tag()), 6);
    assert_eq!(eng.net.sent_of_kind(MessageKind::StateRequest.tag()), 1);
}
