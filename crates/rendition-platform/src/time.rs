//! Runtime clock helpers.
//!
//! Everything time-dependent in the ABR manager reads the clock through
//! [`now`], so paused tokio time in tests drives it deterministically.

pub use tokio::time::sleep;
pub use web_time::Instant;

/// Current instant according to the tokio clock.
pub fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
