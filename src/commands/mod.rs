pub mod export;
pub mod filter;
pub mod init;
pub mod resolve;
pub mod stats;
pub mod validate;

use rand::{rngs::StdRng, SeedableRng};

/// Seeded generator for a command; a fresh seed is drawn and logged when none is given.
fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(rand::random);
    log::info!("Random seed: {}", seed);
    StdRng::seed_from_u64(seed)
}
