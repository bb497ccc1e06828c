//! Shared small types used across the registry, session and event bus.

/// A session handle: a small integer unique within the registry while the session
/// lives, re-used once the session is destroyed.
pub type ClientId = u8;
