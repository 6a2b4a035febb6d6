//! Session start and teardown.

use std::time::Duration;

use rendition_events::{AbrEvent, Event};
use rendition_session::{AbrError, UserConstraints};
use rendition_test_utils::{small_ladder, standard_ladder, tracing_setup};
use rstest::rstest;

use crate::common::{Harness, advance, advance_ms};

#[rstest]
#[tokio::test(start_paused = true)]
async fn destroy_stops_ticking_and_reports_once(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    advance_ms(5_000).await;
    assert_eq!(h.engine.buffer_reads(), 2);

    h.manager.destroy().await;
    h.manager.destroy().await;
    let reads = h.engine.buffer_reads();

    advance(Duration::from_secs(30)).await;

    assert_eq!(h.engine.buffer_reads(), reads);
    assert_eq!(h.analytics.sessions().len(), 1);
    assert_eq!(
        h.log.count(|e| matches!(e, AbrEvent::SessionEnded { .. })),
        1
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn destroy_reports_session_summary(_tracing_setup: ()) {
    let h = Harness::start(small_ladder(), UserConstraints::default()).await;
    // 10 s at 1080p (8000 kbps), then 10 s at 360p (1000 kbps).
    h.manager.set_auto_quality(false).unwrap();
    advance(Duration::from_secs(10)).await;
    h.manager.set_quality("360p").unwrap();
    advance(Duration::from_secs(10)).await;

    h.manager.destroy().await;

    let sessions = h.analytics.sessions();
    let summary = &sessions[0];
    assert_eq!(summary.video_id, "test-video");
    assert_eq!(summary.quality_switch_count, 1);
    assert_eq!(summary.buffering_event_count, 0);
    assert_eq!(summary.session_duration, Duration::from_secs(20));
    assert!((summary.average_quality_bitrate_kbps - 4500.0).abs() < 1e-6);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn controls_after_destroy_fail(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.manager.destroy().await;

    assert!(h.manager.is_destroyed());
    assert!(matches!(h.manager.metrics(), Err(AbrError::Destroyed)));
    assert!(matches!(
        h.manager.set_auto_quality(true),
        Err(AbrError::Destroyed)
    ));
    assert!(matches!(
        h.manager.update_constraints(UserConstraints::default()),
        Err(AbrError::Destroyed)
    ));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn session_started_is_first_event(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;

    assert!(matches!(
        h.log.events().first(),
        Some(Event::Abr(AbrEvent::SessionStarted { video_id, initial_quality, .. }))
            if video_id == "test-video" && initial_quality.as_str() == "2160p"
    ));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unordered_ladder_is_accepted(_tracing_setup: ()) {
    let h = Harness::start(
        rendition_test_utils::shuffled_ladder(),
        UserConstraints::default(),
    )
    .await;
    assert_eq!(h.current(), "2160p");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn dropping_the_manager_stops_ticking(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    let engine = std::sync::Arc::clone(&h.engine);
    drop(h);

    advance_ms(10_000).await;
    assert_eq!(engine.buffer_reads(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn in_flight_switch_never_completes_after_destroy(_tracing_setup: ()) {
    let mut h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    h.engine.set_buffered(0.5);
    h.engine.set_switch_delay("144p", Duration::from_secs(1));

    // The 2 s tick starts the emergency switch; the engine needs 1 s for it.
    advance_ms(2_100).await;
    assert_eq!(h.engine.attempts().last().unwrap().as_str(), "144p");

    h.manager.destroy().await;
    let switches = h.engine.switches();
    advance(Duration::from_secs(5)).await;

    assert_eq!(h.engine.switches(), switches);
    assert!(switches.iter().all(|q| q.as_str() != "144p"));
    assert!(
        h.log
            .switches()
            .iter()
            .all(|(to, _)| to.as_str() != "144p")
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn queued_switch_never_reaches_engine_after_destroy(_tracing_setup: ()) {
    let h = Harness::start(standard_ladder(), UserConstraints::default()).await;
    let attempts = h.engine.attempts();

    // The manual switch task is spawned but not polled before destroy.
    h.manager.set_quality("360p").unwrap();
    h.manager.destroy().await;
    advance(Duration::from_secs(5)).await;

    assert_eq!(h.engine.attempts(), attempts);
}
