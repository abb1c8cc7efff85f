//! Determinism testing utilities.
//!
//! Lockstep multiplayer requires that every client derive the same
//! orders from the same world state. Sources of non-determinism the
//! squad AI guards against:
//!
//! - **Floating-point math**: different CPUs can round differently.
//!   All distances use fixed-point via [`vanguard_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   World queries return ids in stable order and distance ties go to
//!   the first candidate.
//!
//! - **System randomness**: every "random" choice draws from a seeded
//!   stream ([`vanguard_core::rng::DeterministicRng`]).
//!
//! The harness here replays a scenario several times and compares state
//! hashes across runs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use vanguard_core::orders::Order;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// All unique hashes (should be 1 for a deterministic scenario).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert the scenario was deterministic, with a detailed message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Scenario is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the scenario
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial scenario state
/// * `step` - Function to advance the scenario by one tick
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash an order stream by its encoded wire form.
///
/// # Panics
///
/// Panics if the orders fail to encode, which indicates a test bug.
#[must_use]
pub fn hash_orders(orders: &[Order]) -> u64 {
    let bytes = Order::encode_batch(orders).expect("orders encode");
    compute_hash(&bytes)
}

/// Proptest strategies for squad AI inputs.
pub mod strategies {
    use proptest::prelude::*;
    use vanguard_core::math::{CellPos, Fixed, WorldPos};
    use vanguard_core::squad::SquadType;

    /// Fixed-point coordinate in a typical map range.
    pub fn arb_fixed_coord() -> impl Strategy<Value = Fixed> {
        (-50_000i32..50_000i32).prop_map(Fixed::from_num)
    }

    /// World position inside a typical map.
    pub fn arb_world_pos() -> impl Strategy<Value = WorldPos> {
        (arb_fixed_coord(), arb_fixed_coord()).prop_map(|(x, y)| WorldPos::new(x, y))
    }

    /// Map cell inside a 128x128 map.
    pub fn arb_cell() -> impl Strategy<Value = CellPos> {
        (0i32..128, 0i32..128).prop_map(|(x, y)| CellPos::new(x, y))
    }

    /// Any squad type.
    pub fn arb_squad_type() -> impl Strategy<Value = SquadType> {
        prop_oneof![
            Just(SquadType::Assault),
            Just(SquadType::Air),
            Just(SquadType::Rush),
            Just(SquadType::Protection),
            Just(SquadType::Naval),
        ]
    }

    /// Health values (1-1000).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..1000u32
    }

    /// Attack power values (1-100).
    pub fn arb_power() -> impl Strategy<Value = u32> {
        1u32..100u32
    }
}
