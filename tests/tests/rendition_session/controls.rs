//! User controls: auto toggle, manual quality and constraints.

use std::time::Duration;

use rendition_abr::AbrReason;
use rendition_events::{AbrEvent, SwitchCause};
use rendition_session::{AbrError, InvalidQualityReason, UserConstraints};
use rendition_test_utils::{standard_ladder, tracing_setup};
use rstest::rstest;

use crate::common::{Harness, advance, advance_ms};

#[rstest]
#[tokio::test(start_paused = true)]
async fn disabling_auto_freezes_quality(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.manager.set_auto_quality(false).unwrap();
    h.engine.set_buffered(1.0);
    h.feed_kbps(400, 5);

    advance(Duration::from_secs(20)).await;

    assert_eq!(h.current(), "2160p");
    assert_eq!(h.engine.buffer_reads(), 0);
    assert!(h.log.switches().is_empty());
    assert!(!h.manager.metrics().unwrap().auto_quality_enabled);

    h.manager.set_auto_quality(true).unwrap();
    advance_ms(2_500).await;

    assert_eq!(h.current(), "144p");
    assert_eq!(
        h.log.count(|e| matches!(e, AbrEvent::AutoQualityChanged { .. })),
        2
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn manual_quality_is_held_until_auto_resumes(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.manager.set_quality("720p").unwrap();
    h.feed_kbps(50_000, 5);

    advance(Duration::from_secs(20)).await;
    assert_eq!(h.current(), "720p");
    assert_eq!(h.engine.last_switch().unwrap().as_str(), "720p");
    assert_eq!(
        h.log.switches(),
        vec![("720p".into(), SwitchCause::Manual)]
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn manual_quality_outside_ladder_is_rejected(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;

    let err = h.manager.set_quality("8k").unwrap_err();
    assert!(matches!(
        err,
        AbrError::InvalidQuality {
            reason: InvalidQualityReason::NotInLadder,
            ..
        }
    ));
    assert!(h.manager.metrics().unwrap().auto_quality_enabled);
    assert_eq!(h.current(), "2160p");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn data_saver_caps_adaptive_selection(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;

    h.manager
        .update_constraints(UserConstraints::default().with_data_saver(true))
        .unwrap();
    assert_eq!(h.current(), "360p");
    assert_eq!(
        h.log.switches(),
        vec![("360p".into(), SwitchCause::Constraint)]
    );

    h.feed_kbps(20_000, 10);
    advance(Duration::from_secs(25)).await;
    assert_eq!(h.current(), "360p");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn initial_quality_respects_max_quality(_tracing_setup: ()) {
    let h = Harness::start(
        standard_ladder(),
        UserConstraints::default().with_max_quality("1080p"),
    )
    .await;

    assert_eq!(h.current(), "1080p");
    assert_eq!(h.engine.attempts().first().unwrap().as_str(), "1080p");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn lifting_a_cap_lets_the_algorithm_climb(_tracing_setup: ()) {
    let mut h = Harness::start(
        standard_ladder(),
        UserConstraints::default().with_bandwidth_cap(1000),
    )
    .await;
    assert_eq!(h.current(), "360p");

    h.manager.update_constraints(UserConstraints::default()).unwrap();
    h.feed_kbps(6000, 5);

    // No prior switch, so the candidate is seen at 2 s and upgraded at 8 s.
    advance_ms(8_500).await;
    assert_eq!(h.current(), "480p");
    assert!(h.log.switches().contains(&(
        "480p".into(),
        SwitchCause::Adaptive(AbrReason::BandwidthHeadroom)
    )));
}
