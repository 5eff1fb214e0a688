#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use card::*;
pub use dialogue::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use hint::*;
pub use peek::*;
pub use types::*;

mod board;
mod card;
mod dialogue;
mod engine;
mod error;
mod generator;
mod hint;
mod peek;
mod types;

/// Fixed parameters of one matching round.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub pairs: CardCount,
    pub cols: Slot,
    pub lives: u8,
    pub grace_tries: u8,
}

impl MatchConfig {
    pub const fn new_unchecked(pairs: CardCount, cols: Slot, lives: u8, grace_tries: u8) -> Self {
        Self {
            pairs,
            cols,
            lives,
            grace_tries,
        }
    }

    pub fn new(pairs: CardCount, cols: Slot, lives: u8, grace_tries: u8) -> Self {
        let pairs = pairs.clamp(1, Slot::MAX / 2);
        let cols = cols.clamp(1, pair_slots(pairs));
        let lives = lives.max(1);
        Self::new_unchecked(pairs, cols, lives, grace_tries)
    }

    /// The vault board: sixteen cards in two rows of eight.
    pub const fn vault() -> Self {
        Self::new_unchecked(8, 8, 3, 2)
    }

    pub const fn total_slots(&self) -> Slot {
        pair_slots(self.pairs)
    }

    pub const fn rows(&self) -> Slot {
        self.total_slots().div_ceil(self.cols)
    }
}

/// Shuffled `slot -> name` assignment for one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardLayout {
    names: Vec<CardName>,
    cols: Slot,
}

impl CardLayout {
    /// Builds a layout after checking that every name occurs exactly twice.
    pub fn from_names(names: Vec<CardName>, cols: Slot) -> Result<Self> {
        if cols == 0 || names.len() > Slot::MAX as usize {
            return Err(GameError::LayoutMismatch);
        }

        let mut multiplicity: HashMap<CardName, u8> = HashMap::new();
        for &name in &names {
            *multiplicity.entry(name).or_insert(0) += 1;
        }
        if multiplicity.values().any(|&count| count != 2) {
            return Err(GameError::UnbalancedDeck);
        }

        Ok(Self { names, cols })
    }

    pub fn slot_count(&self) -> Slot {
        self.names.len() as Slot
    }

    pub const fn cols(&self) -> Slot {
        self.cols
    }

    pub fn rows(&self) -> Slot {
        self.slot_count().div_ceil(self.cols)
    }

    pub fn pair_count(&self) -> CardCount {
        (self.names.len() / 2) as CardCount
    }

    pub fn validate_slot(&self, slot: Slot) -> Result<Slot> {
        if (slot as usize) < self.names.len() {
            Ok(slot)
        } else {
            Err(GameError::InvalidSlot)
        }
    }

    pub fn name_at(&self, slot: Slot) -> Option<CardName> {
        self.names.get(slot as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn config_clamps_degenerate_values() {
        let config = MatchConfig::new(0, 0, 0, 2);
        assert_eq!(config.pairs, 1);
        assert_eq!(config.cols, 1);
        assert_eq!(config.lives, 1);
    }

    #[test]
    fn vault_config_is_two_rows_of_eight() {
        let config = MatchConfig::vault();
        assert_eq!(config.total_slots(), 16);
        assert_eq!(config.rows(), 2);
    }

    #[test]
    fn layout_rejects_unbalanced_decks() {
        let names = vec![CardName(0), CardName(0), CardName(1)];
        assert_eq!(
            CardLayout::from_names(names, 4).unwrap_err(),
            GameError::UnbalancedDeck
        );

        let triple = vec![CardName(0), CardName(0), CardName(0), CardName(1)];
        assert_eq!(
            CardLayout::from_names(triple, 4).unwrap_err(),
            GameError::UnbalancedDeck
        );
    }

    #[test]
    fn layout_validates_slot_bounds() {
        let names = vec![CardName(0), CardName(1), CardName(0), CardName(1)];
        let layout = CardLayout::from_names(names, 2).unwrap();
        assert_eq!(layout.validate_slot(3), Ok(3));
        assert_eq!(layout.validate_slot(4), Err(GameError::InvalidSlot));
        assert_eq!(layout.rows(), 2);
    }
}
