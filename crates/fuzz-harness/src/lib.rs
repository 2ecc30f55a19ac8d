//! Fuzz Harness
//!
//! Reusable property-based testing infrastructure for the gimbal, RF and track
//! crates. Provides angle/rate/time-step strategies and a seeded ChaCha runner
//! for long-horizon soak checks.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_fuzz_test(az in any_angle_rad()) {
//!         prop_assert!(az.is_finite());
//!     }
//! }
//! ```

pub mod generators;
pub mod runner;

pub mod prelude {
    pub use crate::generators::*;
    pub use crate::runner::{FuzzConfig, FuzzResult, FuzzRunner};
    pub use proptest::prelude::*;
    pub use proptest::test_runner::TestRng;
}

// Re-export proptest for convenience
pub use proptest;
