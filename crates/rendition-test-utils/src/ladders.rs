use rendition_abr::QualityLevel;
use rstest::fixture;

fn level(id: &str, kbps: u32, width: u32, height: u32) -> QualityLevel {
    QualityLevel::new(id, kbps)
        .with_label(id)
        .with_resolution(width, height)
        .with_audio_bitrate(128)
        .with_codec("avc1.64001f")
}

/// Eight-rung ladder from 144p (300 kbps) to 2160p (35 Mbps).
#[fixture]
pub fn standard_ladder() -> Vec<QualityLevel> {
    vec![
        level("144p", 300, 256, 144),
        level("240p", 500, 426, 240),
        level("360p", 1000, 640, 360),
        level("480p", 2500, 854, 480),
        level("720p", 5000, 1280, 720),
        level("1080p", 8000, 1920, 1080),
        level("1440p", 16000, 2560, 1440),
        level("2160p", 35000, 3840, 2160),
    ]
}

/// Same ladder as [`standard_ladder`] in reverse order, as some manifests list it.
#[fixture]
pub fn shuffled_ladder() -> Vec<QualityLevel> {
    let mut levels = standard_ladder();
    levels.reverse();
    levels
}

/// Three rungs, for tests that only need up and down.
#[fixture]
pub fn small_ladder() -> Vec<QualityLevel> {
    vec![
        level("360p", 1000, 640, 360),
        level("720p", 5000, 1280, 720),
        level("1080p", 8000, 1920, 1080),
    ]
}
