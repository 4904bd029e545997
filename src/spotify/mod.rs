//! Candidate songs from the Spotify Web API.

mod client;
mod models;
mod supplier;
mod token_cache;

pub use client::SpotifyClient;
pub use supplier::{CandidateSong, CandidateSupplier, SupplierError};
pub use token_cache::{ClientCredentialsSource, TokenCache, TokenSource, REFRESH_MARGIN};

#[cfg(feature = "mock")]
pub use supplier::MockCandidateSupplier;
