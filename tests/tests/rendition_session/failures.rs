//! Engine failures are contained: no panics, no phantom switches.

use std::time::Duration;

use rendition_abr::AbrReason;
use rendition_events::{AbrEvent, SwitchCause};
use rendition_session::UserConstraints;
use rendition_test_utils::{standard_ladder, tracing_setup};
use rstest::rstest;

use crate::common::{Harness, advance_ms};

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_switch_keeps_quality_and_retries(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.engine.make_unavailable("144p");
    h.engine.set_buffered(1.0);

    advance_ms(4_500).await;

    assert_eq!(h.current(), "2160p");
    let failures = h.log.count(|e| {
        matches!(
            e,
            AbrEvent::SwitchFailed {
                cause: SwitchCause::Adaptive(AbrReason::CriticalBuffer),
                ..
            }
        )
    });
    assert_eq!(failures, 2);
    assert_eq!(h.manager.metrics().unwrap().quality_switch_count, 0);

    h.engine.make_available("144p");
    advance_ms(2_000).await;
    assert_eq!(h.current(), "144p");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unreadable_buffer_skips_evaluation(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.engine.fail_reads(true);
    h.engine.set_buffered(1.0);

    advance_ms(6_500).await;

    assert!(h.engine.buffer_reads() >= 3);
    assert!(h.log.switches().is_empty());
    assert_eq!(h.current(), "2160p");

    h.engine.fail_reads(false);
    advance_ms(2_000).await;
    assert_eq!(h.current(), "144p");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn read_failure_falls_back_to_last_known_buffer(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.engine.set_buffered(1.0);
    advance_ms(2_500).await;
    assert_eq!(h.current(), "144p");

    // Last reading was critical; while reads fail the manager keeps acting
    // on it and never climbs.
    h.engine.fail_reads(true);
    h.engine.set_buffered(30.0);
    h.feed_kbps(50_000, 5);
    advance_ms(20_000).await;

    assert_eq!(h.current(), "144p");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_engine_does_not_block_controls(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.engine.set_switch_delay("144p", Duration::from_secs(5));
    h.engine.set_buffered(1.0);

    advance_ms(2_500).await;
    // Emergency switch is still in flight.
    assert_eq!(h.current(), "2160p");
    let metrics = h.manager.metrics().unwrap();
    assert_eq!(metrics.quality_switch_count, 0);

    advance_ms(5_000).await;
    assert_eq!(h.current(), "144p");
}
