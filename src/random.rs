//! Random alias generation

use rand::{distr::Alphanumeric, Rng};

/// Returns `length` characters drawn uniformly from `[A-Za-z0-9]`.
///
/// Uses the thread-local generator, which is seeded once per thread.
/// Collisions are possible and are caught by the store's uniqueness check.
pub fn generate_alias(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
