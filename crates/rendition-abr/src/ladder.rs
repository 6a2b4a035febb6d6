use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a quality level (e.g. `"720p"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityId(String);

impl QualityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QualityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for QualityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One pre-encoded rendition of a video.
///
/// Created once from video metadata and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityLevel {
    pub id: QualityId,
    /// Human-readable name shown in quality menus.
    pub label: String,
    pub width_px: u32,
    pub height_px: u32,
    /// Encoded video bitrate; the ladder is ordered by this value.
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
    /// Codec string (e.g. `"avc1.64001f"`).
    pub codec: String,
}

impl QualityLevel {
    /// Create a level with the given id and video bitrate.
    ///
    /// The label defaults to the id; resolution, audio bitrate and codec are
    /// left empty and can be filled in with the `with_*` builders.
    pub fn new(id: impl Into<QualityId>, video_bitrate_kbps: u32) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            width_px: 0,
            height_px: 0,
            video_bitrate_kbps,
            audio_bitrate_kbps: 0,
            codec: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_resolution(mut self, width_px: u32, height_px: u32) -> Self {
        self.width_px = width_px;
        self.height_px = height_px;
        self
    }

    pub fn with_audio_bitrate(mut self, audio_bitrate_kbps: u32) -> Self {
        self.audio_bitrate_kbps = audio_bitrate_kbps;
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LadderError {
    #[error("quality ladder is empty")]
    Empty,
    #[error("two quality levels share the bitrate {kbps} kbps")]
    DuplicateBitrate { kbps: u32 },
    #[error("quality id {0} appears more than once")]
    DuplicateId(QualityId),
    #[error("quality level {0} has a zero video bitrate")]
    ZeroBitrate(QualityId),
}

pub type LadderResult<T> = Result<T, LadderError>;

/// Quality levels of one video, ordered by ascending video bitrate.
///
/// A ladder is never empty and no two levels share a bitrate or an id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QualityLadder {
    levels: Vec<QualityLevel>,
}

impl QualityLadder {
    /// Validate and sort `levels` into a ladder.
    pub fn new(mut levels: Vec<QualityLevel>) -> LadderResult<Self> {
        if levels.is_empty() {
            return Err(LadderError::Empty);
        }

        {
            let mut ids = HashSet::with_capacity(levels.len());
            for level in &levels {
                if level.video_bitrate_kbps == 0 {
                    return Err(LadderError::ZeroBitrate(level.id.clone()));
                }
                if !ids.insert(&level.id) {
                    return Err(LadderError::DuplicateId(level.id.clone()));
                }
            }
        }

        levels.sort_by_key(|l| l.video_bitrate_kbps);
        if let Some(pair) = levels
            .windows(2)
            .find(|w| w[0].video_bitrate_kbps == w[1].video_bitrate_kbps)
        {
            return Err(LadderError::DuplicateBitrate {
                kbps: pair[0].video_bitrate_kbps,
            });
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[QualityLevel] {
        &self.levels
    }

    pub fn lowest(&self) -> &QualityLevel {
        &self.levels[0]
    }

    pub fn highest(&self) -> &QualityLevel {
        &self.levels[self.levels.len() - 1]
    }

    pub fn get(&self, id: &QualityId) -> Option<&QualityLevel> {
        self.levels.iter().find(|l| &l.id == id)
    }

    pub fn contains(&self, id: &QualityId) -> bool {
        self.get(id).is_some()
    }

    fn position(&self, id: &QualityId) -> Option<usize> {
        self.levels.iter().position(|l| &l.id == id)
    }

    /// The level directly below `id`, if any.
    pub fn next_lower(&self, id: &QualityId) -> Option<&QualityLevel> {
        match self.position(id)? {
            0 => None,
            idx => self.levels.get(idx - 1),
        }
    }

    /// Highest level whose video bitrate does not exceed `kbps`.
    pub fn highest_at_or_below(&self, kbps: f64) -> Option<&QualityLevel> {
        self.levels
            .iter()
            .rev()
            .find(|l| f64::from(l.video_bitrate_kbps) <= kbps)
    }

    /// Sub-ladder of levels at or below `max_kbps`.
    ///
    /// The lowest level is always kept so the result is never empty.
    #[must_use]
    pub fn capped_at(&self, max_kbps: u32) -> Self {
        let levels: Vec<QualityLevel> = self
            .levels
            .iter()
            .enumerate()
            .filter(|(idx, l)| *idx == 0 || l.video_bitrate_kbps <= max_kbps)
            .map(|(_, l)| l.clone())
            .collect();
        Self { levels }
    }
}
