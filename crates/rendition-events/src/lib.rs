#![forbid(unsafe_code)]

//! Unified event bus for the rendition ABR stack.

mod abr;
mod bus;
mod event;
mod playback;

pub use abr::{AbrEvent, SwitchCause};
pub use bus::EventBus;
pub use event::Event;
pub use playback::PlaybackEvent;
