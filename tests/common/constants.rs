//! Shared constants for end-to-end tests

/// Regular test user handle
pub const TEST_USER: &str = "listener";

/// Seed artists that the stub API knows about
pub const KNOWN_ARTIST: &str = "The Test Band";
pub const KNOWN_ARTIST_ID: &str = "artist-1";

/// Seed artist the stub API has never heard of
pub const UNKNOWN_ARTIST: &str = "Nobody At All";

/// Track with a preview clip
pub const TRACK_WITH_PREVIEW_ID: &str = "track-1";
pub const TRACK_WITH_PREVIEW_NAME: &str = "Opening Track";

/// Track without a preview clip
pub const TRACK_WITHOUT_PREVIEW_ID: &str = "track-2";

pub const STUB_TOKEN: &str = "stub-token";
