use core::fmt;
use serde::{Deserialize, Serialize};

/// Index of a grid slot, row-major from the top-left.
pub type Slot = u8;

/// Count type used for pairs, cards, and lives.
pub type CardCount = u8;

/// One face of the fixed card alphabet; every name is printed on exactly
/// two cards per round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardName(pub u8);

impl CardName {
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card-{}", self.0)
    }
}

pub const fn pair_slots(pairs: CardCount) -> Slot {
    (pairs as Slot).saturating_mul(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn card_names_render_with_their_index() {
        assert_eq!(CardName(0).to_string(), "card-0");
        assert_eq!(CardName(7).to_string(), "card-7");
    }

    #[test]
    fn pair_slots_doubles_and_saturates() {
        assert_eq!(pair_slots(8), 16);
        assert_eq!(pair_slots(200), Slot::MAX);
    }
}
