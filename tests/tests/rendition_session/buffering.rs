//! Stall counting and the forced downgrade after repeated buffering.

use rendition_abr::AbrReason;
use rendition_events::{AbrEvent, PlaybackEvent, SwitchCause};
use rendition_session::UserConstraints;
use rendition_test_utils::{standard_ladder, tracing_setup};
use rstest::rstest;

use crate::common::{Harness, advance_ms};

async fn stall(h: &Harness) {
    h.engine.emit(PlaybackEvent::Waiting);
    advance_ms(10).await;
    h.engine.emit(PlaybackEvent::Playing);
    advance_ms(10).await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn three_stalls_force_one_step_down_and_reset(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    for _ in 0..3 {
        stall(&h).await;
    }

    let metrics = h.manager.metrics().unwrap();
    assert_eq!(metrics.pending_buffering_events, 3);
    assert_eq!(metrics.buffering_event_count, 3);

    // No bandwidth estimate at all; the forced downgrade does not need one.
    advance_ms(2_000).await;

    let metrics = h.manager.metrics().unwrap();
    assert_eq!(metrics.current_quality.as_str(), "1440p");
    assert_eq!(metrics.pending_buffering_events, 0);
    assert_eq!(metrics.buffering_event_count, 3);
    assert_eq!(
        h.log.switches(),
        vec![(
            "1440p".into(),
            SwitchCause::Adaptive(AbrReason::BufferingEvents)
        )]
    );

    advance_ms(10_000).await;
    assert_eq!(h.current(), "1440p");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn each_counted_stall_is_published(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    stall(&h).await;
    stall(&h).await;

    let detected: Vec<_> = h
        .log
        .abr_events()
        .into_iter()
        .filter_map(|e| match e {
            AbrEvent::BufferingDetected { pending, total } => Some((pending, total)),
            _ => None,
        })
        .collect();
    assert_eq!(detected, vec![(1, 1), (2, 2)]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn repeated_waiting_counts_once(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.engine.emit(PlaybackEvent::Waiting);
    h.engine.emit(PlaybackEvent::Stalled);
    h.engine.emit(PlaybackEvent::Waiting);
    advance_ms(10).await;

    assert_eq!(h.manager.metrics().unwrap().buffering_event_count, 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn seeking_stalls_are_not_counted(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.engine.emit(PlaybackEvent::Seeking { to_secs: 120.0 });
    h.engine.emit(PlaybackEvent::Waiting);
    h.engine.emit(PlaybackEvent::Seeked {
        position_secs: 120.0,
    });
    h.engine.emit(PlaybackEvent::Playing);
    advance_ms(10).await;

    assert_eq!(h.manager.metrics().unwrap().buffering_event_count, 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn forced_downgrade_at_lowest_only_resets(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.start_from("144p");
    for _ in 0..3 {
        stall(&h).await;
    }

    advance_ms(2_000).await;

    let metrics = h.manager.metrics().unwrap();
    assert_eq!(metrics.current_quality.as_str(), "144p");
    assert_eq!(metrics.pending_buffering_events, 0);
}
