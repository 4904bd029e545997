//! Filters supplier candidates through a user's taste profile.

mod filter;
mod retry_policy;
mod service;

pub use filter::{Decision, RecommendationFilter};
pub use retry_policy::RetryPolicy;
pub use service::{RecommendationError, RecommendationService};
