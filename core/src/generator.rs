use alloc::vec::Vec;

use crate::*;

/// Builds the shuffled card layout for a round.
pub trait LayoutGenerator {
    fn generate(self, config: &MatchConfig) -> CardLayout;
}

/// Duplicates the name alphabet and lays it out with a uniform shuffle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShuffledLayoutGenerator {
    seed: u64,
}

impl ShuffledLayoutGenerator {
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LayoutGenerator for ShuffledLayoutGenerator {
    fn generate(self, config: &MatchConfig) -> CardLayout {
        use rand::prelude::*;

        let mut names: Vec<CardName> = (0..config.pairs)
            .flat_map(|n| [CardName(n), CardName(n)])
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        names.shuffle(&mut rng);

        // double check the deck balance
        CardLayout::from_names(names, config.cols).expect("duplicated alphabet is balanced")
    }
}
