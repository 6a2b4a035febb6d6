//! Bandwidth estimation as seen through the manager.

use std::time::Duration;

use rendition_session::{ManagerOptions, UserConstraints};
use rendition_abr::NetworkMonitorOptions;
use rendition_test_utils::{standard_ladder, tracing_setup};
use rstest::rstest;

use crate::common::{Harness, advance};

fn assert_kbps(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap();
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected} kbps, got {actual}"
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn five_segments_estimate_one_megabit(_tracing_setup: ()) {
    let harness = Harness::start(standard_ladder(), UserConstraints::default()).await;
    let network = harness.manager.network();

    for _ in 0..5 {
        network.on_segment_downloaded(125_000, Duration::from_millis(1000));
    }

    assert_eq!(network.sample_count(), 5);
    assert_kbps(harness.manager.metrics().unwrap().estimated_bandwidth_kbps, 1000.0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn no_samples_means_unknown_bandwidth(_tracing_setup: ()) {
    let harness = Harness::start(standard_ladder(), UserConstraints::default()).await;
    assert_eq!(harness.manager.metrics().unwrap().estimated_bandwidth_kbps, None);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn zero_duration_samples_are_ignored(_tracing_setup: ()) {
    let harness = Harness::start(standard_ladder(), UserConstraints::default()).await;
    let network = harness.manager.network();

    network.on_segment_downloaded(500_000, Duration::ZERO);
    network.on_segment_downloaded(250_000, Duration::from_secs(1));

    assert_eq!(network.sample_count(), 1);
    assert_kbps(harness.manager.metrics().unwrap().estimated_bandwidth_kbps, 2000.0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stale_samples_expire(_tracing_setup: ()) {
    let options = ManagerOptions::default().with_monitor(NetworkMonitorOptions {
        max_samples: 10,
        max_age: Duration::from_secs(30),
    });
    let harness = Harness::start_with(options, standard_ladder(), UserConstraints::default()).await;
    harness.feed_kbps(4000, 3);

    advance(Duration::from_secs(31)).await;

    assert_eq!(harness.manager.metrics().unwrap().estimated_bandwidth_kbps, None);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn window_keeps_most_recent_samples(_tracing_setup: ()) {
    let harness = Harness::start(standard_ladder(), UserConstraints::default()).await;
    harness.feed_kbps(500, 10);
    harness.feed_kbps(3000, 10);

    assert_eq!(harness.manager.network().sample_count(), 10);
    assert_kbps(harness.manager.metrics().unwrap().estimated_bandwidth_kbps, 3000.0);
}
