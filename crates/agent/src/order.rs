//! Per-round turn order.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use symposium_core::session::OrderPolicy;

/// Produces the speaking order for each round.
///
/// The random source is owned so that a seeded run is reproducible from
/// start to finish.
pub struct TurnOrder {
    policy: OrderPolicy,
    rng: StdRng,
}

impl TurnOrder {
    /// `seed = None` draws the seed from the operating system.
    pub fn new(policy: OrderPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { policy, rng }
    }

    pub fn policy(&self) -> OrderPolicy {
        self.policy
    }

    /// The order for the next round: a permutation of `roster`.
    pub fn next_round(&mut self, roster: &[String]) -> Vec<String> {
        let mut order = roster.to_vec();
        if self.policy == OrderPolicy::Shuffle {
            order.shuffle(&mut self.rng);
        }
        order
    }
}
