//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestEnv, TEST_USER};
//!
//! #[test]
//! fn test_rate() {
//!     let env = TestEnv::new();
//!     let user_id = env.user_id(TEST_USER);
//! }
//! ```

mod constants;
mod fixtures;
mod stub_api;
mod suppliers;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{candidate, fast_settings, features_at, TestEnv};
#[allow(unused_imports)]
pub use stub_api::StubApi;
#[allow(unused_imports)]
pub use suppliers::ScriptedSupplier;
