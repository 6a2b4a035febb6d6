//! Integration tests for rendition-abr

mod bandwidth;
mod serialization;
