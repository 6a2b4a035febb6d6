//! All integration tests for rendition
#![expect(
    clippy::unwrap_used,
    reason = "integration test crate — unwraps are acceptable in test code"
)]

mod common;
mod rendition_abr;
mod rendition_session;
