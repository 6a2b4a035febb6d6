//! Integration tests for rendition-session

mod buffering;
mod controls;
mod failures;
mod lifecycle;
