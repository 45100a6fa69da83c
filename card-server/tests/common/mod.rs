//! Shared helpers for card-server integration tests.

pub mod server;

#[allow(unused_imports)]
pub use server::{TestServer, RED_PIXEL_PNG, UNREACHABLE_VERSE_BASE};
