use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named ABR tuning preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Climbs quickly, tolerates thinner bandwidth headroom.
    Aggressive,
    #[default]
    Balanced,
    /// Climbs slowly and drops early.
    Conservative,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Self::Aggressive, Self::Balanced, Self::Conservative];

    pub fn name(self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Balanced => "balanced",
            Self::Conservative => "conservative",
        }
    }

    /// Thresholds and timers for this preset.
    pub const fn config(self) -> StrategyConfig {
        match self {
            Self::Aggressive => StrategyConfig {
                upgrade_delay: Duration::from_millis(3000),
                downgrade_delay: Duration::from_millis(3000),
                min_switch_interval: Duration::from_millis(2000),
                upgrade_bandwidth_multiplier: 1.2,
                downgrade_bandwidth_multiplier: 1.1,
                ..StrategyConfig::SHARED
            },
            Self::Balanced => StrategyConfig {
                upgrade_delay: Duration::from_millis(5000),
                downgrade_delay: Duration::from_millis(2000),
                min_switch_interval: Duration::from_millis(3000),
                upgrade_bandwidth_multiplier: 1.5,
                downgrade_bandwidth_multiplier: 1.0,
                ..StrategyConfig::SHARED
            },
            Self::Conservative => StrategyConfig {
                upgrade_delay: Duration::from_millis(8000),
                downgrade_delay: Duration::from_millis(1000),
                min_switch_interval: Duration::from_millis(4000),
                upgrade_bandwidth_multiplier: 2.0,
                downgrade_bandwidth_multiplier: 0.9,
                ..StrategyConfig::SHARED
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown ABR strategy: {0}")]
pub struct StrategyParseError(pub String);

impl FromStr for Strategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StrategyParseError(s.to_string()))
    }
}

/// Thresholds and timers used by the decision engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// How long an upgrade target must stay eligible before switching.
    pub upgrade_delay: Duration,
    /// How long a bandwidth drop must persist before switching down.
    pub downgrade_delay: Duration,
    /// Minimum spacing between non-emergency switches.
    pub min_switch_interval: Duration,
    /// Bandwidth is divided by this before choosing an upgrade target.
    pub upgrade_bandwidth_multiplier: f64,
    /// Downgrade when bandwidth falls below `current / multiplier`.
    pub downgrade_bandwidth_multiplier: f64,
    /// Below this buffer level the engine drops straight to the lowest level.
    pub critical_buffer_secs: f64,
    /// Upgrades are only considered at or above this buffer level.
    pub good_buffer_secs: f64,
    pub max_buffering_events_before_forced_downgrade: u32,
}

impl StrategyConfig {
    const SHARED: Self = Self {
        upgrade_delay: Duration::ZERO,
        downgrade_delay: Duration::ZERO,
        min_switch_interval: Duration::ZERO,
        upgrade_bandwidth_multiplier: 1.0,
        downgrade_bandwidth_multiplier: 1.0,
        critical_buffer_secs: 2.0,
        good_buffer_secs: 10.0,
        max_buffering_events_before_forced_downgrade: 3,
    };
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Strategy::default().config()
    }
}
