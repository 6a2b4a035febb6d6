use rendition_abr::{QualityId, QualityLadder, QualityLevel};
use serde::{Deserialize, Serialize};

use crate::{AbrError, AbrResult, InvalidQualityReason};

/// User preferences that bound which qualities may be played.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConstraints {
    /// Highest quality the user allows, manual selection included.
    pub max_quality_id: Option<QualityId>,
    /// Cap adaptive selection at the data-saver bitrate.
    pub data_saver_mode: bool,
    /// Cap adaptive selection at this video bitrate.
    pub bandwidth_cap_kbps: Option<u32>,
}

impl UserConstraints {
    #[must_use]
    pub fn with_max_quality(mut self, id: impl Into<QualityId>) -> Self {
        self.max_quality_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_data_saver(mut self, enabled: bool) -> Self {
        self.data_saver_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_bandwidth_cap(mut self, kbps: u32) -> Self {
        self.bandwidth_cap_kbps = Some(kbps);
        self
    }

    /// Check that every referenced quality exists in `ladder`.
    pub fn validate(&self, ladder: &QualityLadder) -> AbrResult<()> {
        match &self.max_quality_id {
            Some(id) if !ladder.contains(id) => Err(AbrError::InvalidQuality {
                id: id.clone(),
                reason: InvalidQualityReason::NotInLadder,
            }),
            _ => Ok(()),
        }
    }

    /// Levels adaptive selection may pick from.
    ///
    /// The lowest level is always kept, even when every cap is below it.
    pub fn allowed_ladder(&self, ladder: &QualityLadder, data_saver_max_kbps: u32) -> QualityLadder {
        let max_quality_kbps = self
            .max_quality_id
            .as_ref()
            .and_then(|id| ladder.get(id))
            .map(|level| level.video_bitrate_kbps);

        let cap = [
            max_quality_kbps,
            self.bandwidth_cap_kbps,
            self.data_saver_mode.then_some(data_saver_max_kbps),
        ]
        .into_iter()
        .flatten()
        .min();

        match cap {
            Some(kbps) => ladder.capped_at(kbps),
            None => ladder.clone(),
        }
    }

    /// Resolve a manual selection, rejecting unknown ids and ids above
    /// `max_quality_id`.
    ///
    /// Data saver and bandwidth cap only bound adaptive selection.
    pub fn check_manual<'l>(
        &self,
        ladder: &'l QualityLadder,
        id: &QualityId,
    ) -> AbrResult<&'l QualityLevel> {
        let level = ladder.get(id).ok_or_else(|| AbrError::InvalidQuality {
            id: id.clone(),
            reason: InvalidQualityReason::NotInLadder,
        })?;

        match self.max_quality_id.as_ref().and_then(|max| ladder.get(max)) {
            Some(max) if level.video_bitrate_kbps > max.video_bitrate_kbps => {
                Err(AbrError::InvalidQuality {
                    id: id.clone(),
                    reason: InvalidQualityReason::ExceedsMaxQuality {
                        max: max.id.clone(),
                    },
                })
            }
            _ => Ok(level),
        }
    }
}
