//! Serialized forms used by preference stores and analytics backends.

use rendition_abr::{SessionSummary, Strategy};
use rendition_session::UserConstraints;
use serde_json::json;

#[test]
fn strategy_round_trips_as_lowercase_name() {
    let value = serde_json::to_value(Strategy::Conservative).unwrap();
    assert_eq!(value, json!("conservative"));

    let parsed: Strategy = serde_json::from_value(json!("aggressive")).unwrap();
    assert_eq!(parsed, Strategy::Aggressive);
}

#[test]
fn constraints_deserialize_from_preferences() {
    let constraints: UserConstraints = serde_json::from_value(json!({
        "max_quality_id": "720p",
        "data_saver_mode": false,
        "bandwidth_cap_kbps": 4000
    }))
    .unwrap();

    assert_eq!(
        constraints,
        UserConstraints::default()
            .with_max_quality("720p")
            .with_bandwidth_cap(4000)
    );
}

#[test]
fn summary_serializes_for_analytics() {
    let summary = SessionSummary {
        video_id: "v-1".to_owned(),
        strategy: Strategy::Balanced,
        quality_switch_count: 4,
        buffering_event_count: 1,
        average_quality_bitrate_kbps: 3250.5,
        session_duration: std::time::Duration::from_secs(90),
    };

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["video_id"], json!("v-1"));
    assert_eq!(value["strategy"], json!("balanced"));
    assert_eq!(value["quality_switch_count"], json!(4));
    assert_eq!(value["average_quality_bitrate_kbps"], json!(3250.5));
}
