use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::*;

/// The live grid: position-indexed cards plus the reverse identity map.
///
/// The two maps stay in lockstep; `remove_pair` is the only removal path
/// and deletes both cards from both maps or nothing at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    slots: HashMap<Slot, Card>,
    positions: HashMap<CardId, Slot>,
    cols: Slot,
    slot_count: Slot,
}

impl Board {
    pub fn from_layout(layout: &CardLayout, nonce: u32) -> Self {
        let slot_count = layout.slot_count();
        let mut slots = HashMap::with_capacity(slot_count as usize);
        let mut positions = HashMap::with_capacity(slot_count as usize);

        for slot in 0..slot_count {
            let name = match layout.name_at(slot) {
                Some(name) => name,
                None => continue,
            };
            let id = CardId { nonce, slot };
            slots.insert(slot, Card::new(id, name));
            positions.insert(id, slot);
        }

        Self {
            slots,
            positions,
            cols: layout.cols(),
            slot_count,
        }
    }

    pub const fn cols(&self) -> Slot {
        self.cols
    }

    pub fn rows(&self) -> Slot {
        self.slot_count.div_ceil(self.cols)
    }

    /// Number of grid positions the round was dealt with, including ones
    /// whose cards have since been matched away.
    pub const fn slot_count(&self) -> Slot {
        self.slot_count
    }

    pub fn remaining(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn card_at(&self, slot: Slot) -> Option<&Card> {
        self.slots.get(&slot)
    }

    pub fn slot_of(&self, id: CardId) -> Option<Slot> {
        self.positions.get(&id).copied()
    }

    pub fn validate_slot(&self, slot: Slot) -> Result<Slot> {
        if slot < self.slot_count {
            Ok(slot)
        } else {
            Err(GameError::InvalidSlot)
        }
    }

    pub(crate) fn card_at_mut(&mut self, slot: Slot) -> Option<&mut Card> {
        self.slots.get_mut(&slot)
    }

    /// Removes a matched pair atomically. Both entries are checked against
    /// the reverse map first; a disagreement leaves the board untouched.
    pub(crate) fn remove_pair(&mut self, a: Slot, b: Slot) -> Result<(Card, Card)> {
        if a == b {
            return Err(GameError::UnexpectedEvent);
        }

        let id_a = self.slots.get(&a).map(Card::id).ok_or(GameError::InvalidSlot)?;
        let id_b = self.slots.get(&b).map(Card::id).ok_or(GameError::InvalidSlot)?;

        if self.positions.get(&id_a) != Some(&a) || self.positions.get(&id_b) != Some(&b) {
            log::error!("slot and card mappings disagree for slots {} and {}", a, b);
            return Err(GameError::MappingDesync);
        }

        self.positions.remove(&id_a);
        self.positions.remove(&id_b);
        let card_a = self.slots.remove(&a).ok_or(GameError::MappingDesync)?;
        let card_b = self.slots.remove(&b).ok_or(GameError::MappingDesync)?;
        Ok((card_a, card_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn layout() -> CardLayout {
        let names = (0..2u8)
            .flat_map(|n| [CardName(n), CardName(n)])
            .collect::<Vec<_>>();
        CardLayout::from_names(names, 2).unwrap()
    }

    #[test]
    fn boards_from_different_rounds_share_no_identities() {
        let first = Board::from_layout(&layout(), 1);
        let second = Board::from_layout(&layout(), 2);

        for slot in 0..first.slot_count() {
            let a = first.card_at(slot).unwrap().id();
            let b = second.card_at(slot).unwrap().id();
            assert_ne!(a, b);
        }
    }

    #[test]
    fn remove_pair_clears_both_mappings() {
        let mut board = Board::from_layout(&layout(), 7);
        let id_a = board.card_at(0).unwrap().id();
        let id_b = board.card_at(1).unwrap().id();

        let (card_a, card_b) = board.remove_pair(0, 1).unwrap();

        assert_eq!(card_a.id(), id_a);
        assert_eq!(card_b.id(), id_b);
        assert!(board.card_at(0).is_none());
        assert!(board.card_at(1).is_none());
        assert_eq!(board.slot_of(id_a), None);
        assert_eq!(board.slot_of(id_b), None);
        assert_eq!(board.remaining(), 2);
    }

    #[test]
    fn remove_pair_rejects_vacant_slots_without_side_effects() {
        let mut board = Board::from_layout(&layout(), 7);
        board.remove_pair(0, 1).unwrap();

        assert_eq!(board.remove_pair(0, 2), Err(GameError::InvalidSlot));
        assert_eq!(board.remaining(), 2);
        assert!(board.card_at(2).is_some());
    }

    #[test]
    fn desynced_mappings_are_refused_loudly() {
        let mut board = Board::from_layout(&layout(), 7);
        let id = board.card_at(0).unwrap().id();
        board.positions.remove(&id);

        assert_eq!(board.remove_pair(0, 1), Err(GameError::MappingDesync));
        assert_eq!(board.remaining(), 4);
        assert!(board.card_at(1).is_some());
    }
}
