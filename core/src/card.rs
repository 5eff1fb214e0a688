use serde::{Deserialize, Serialize};

use crate::types::{CardName, Slot};

/// Round-scoped card identity. The nonce changes with every deal, so ids
/// from different rounds never compare equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId {
    pub nonce: u32,
    pub slot: Slot,
}

/// A single card, owned exclusively by the board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    name: CardName,
    face_down: bool,
    flipping: bool,
}

impl Card {
    pub(crate) const fn new(id: CardId, name: CardName) -> Self {
        Self {
            id,
            name,
            face_down: true,
            flipping: false,
        }
    }

    pub const fn id(&self) -> CardId {
        self.id
    }

    pub const fn name(&self) -> CardName {
        self.name
    }

    pub const fn is_face_down(&self) -> bool {
        self.face_down
    }

    /// A flip animation is outstanding; the card cannot be targeted again
    /// until it settles.
    pub const fn is_flipping(&self) -> bool {
        self.flipping
    }

    pub(crate) fn begin_flip(&mut self) {
        self.flipping = true;
    }

    pub(crate) fn settle_face(&mut self, face_down: bool) {
        self.face_down = face_down;
        self.flipping = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_start_face_down_and_settled() {
        let card = Card::new(CardId { nonce: 1, slot: 0 }, CardName(3));
        assert!(card.is_face_down());
        assert!(!card.is_flipping());
    }

    #[test]
    fn settling_clears_the_flip_marker() {
        let mut card = Card::new(CardId { nonce: 1, slot: 0 }, CardName(3));
        card.begin_flip();
        assert!(card.is_flipping());
        card.settle_face(false);
        assert!(!card.is_flipping());
        assert!(!card.is_face_down());
    }
}
