//! Cryptographic primitives shared by the video library services.
//!
//! - `jwt`: RS256 access-token signing and verification
//! - `test_utils` (feature `test-utils`): fixed key pair for tests

pub mod jwt;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
