use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Slots collected for a batched flip, large enough for a full vault board.
pub type SlotBatch = SmallVec<[Slot; 16]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Won,
    Lost,
}

/// Phase of the round as derived from the engine fields, for display and
/// assertions; the fields themselves are the ground truth.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    /// Cards are dealt but movement has not been unlocked yet.
    Staging,
    AwaitingFirst,
    Flipping,
    OneOpen,
    Resolving,
    Won,
    Lost,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The selection failed the validity gate; nothing changed.
    Ignored,
    FirstFlip(Slot),
    SecondFlip { open: Slot, second: Slot },
}

impl SelectOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    /// The first card of a try is now face-up and held open.
    Opened(Slot),
    Matched { a: Slot, b: Slot, won: bool },
    Mismatched { a: Slot, b: Slot, life_lost: bool },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MismatchSettled {
    Continue,
    Lost,
}

/// State machine for one matching round.
///
/// Every mutation happens in exactly one event method: a validated
/// selection (`select`), an animation completion (`flip_finished`,
/// `mismatch_settled`), or a peek settle driven by [`PeekController`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchEngine {
    config: MatchConfig,
    board: Board,
    seen: HashSet<Slot>,
    lives: u8,
    grace: u8,
    opened: Option<Slot>,
    pending: Option<Slot>,
    resolving: Option<(Slot, Slot)>,
    can_move: bool,
    peeking: bool,
    paused: bool,
    outcome: Option<RoundOutcome>,
}

impl MatchEngine {
    pub fn new(config: MatchConfig, layout: CardLayout, nonce: u32) -> Result<Self> {
        if layout.slot_count() != config.total_slots() || layout.cols() != config.cols {
            return Err(GameError::LayoutMismatch);
        }

        Ok(Self {
            board: Board::from_layout(&layout, nonce),
            seen: HashSet::new(),
            lives: config.lives,
            grace: config.grace_tries,
            opened: None,
            pending: None,
            resolving: None,
            can_move: false,
            peeking: false,
            paused: false,
            outcome: None,
            config,
        })
    }

    /// Unlocks movement once the deal-in animation has settled.
    pub fn arm(&mut self) {
        if self.outcome.is_none() {
            self.can_move = true;
        }
    }

    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub const fn board(&self) -> &Board {
        &self.board
    }

    pub const fn lives(&self) -> u8 {
        self.lives
    }

    pub const fn grace(&self) -> u8 {
        self.grace
    }

    pub const fn opened(&self) -> Option<Slot> {
        self.opened
    }

    pub const fn can_move(&self) -> bool {
        self.can_move
    }

    pub const fn is_peeking(&self) -> bool {
        self.peeking
    }

    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    pub const fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether a human flip has ever revealed the card at this slot.
    pub fn seen(&self, slot: Slot) -> bool {
        self.seen.contains(&slot)
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn phase(&self) -> EnginePhase {
        match self.outcome {
            Some(RoundOutcome::Won) => EnginePhase::Won,
            Some(RoundOutcome::Lost) => EnginePhase::Lost,
            None if self.resolving.is_some() => EnginePhase::Resolving,
            None if self.pending.is_some() => EnginePhase::Flipping,
            None if self.opened.is_some() => EnginePhase::OneOpen,
            None if self.can_move => EnginePhase::AwaitingFirst,
            None => EnginePhase::Staging,
        }
    }

    /// The selection validity gate, evaluated before any mutation. This is
    /// the sole guard against re-entrant flips.
    pub fn can_select(&self, slot: Slot) -> bool {
        if !self.can_move || self.paused || self.peeking || self.outcome.is_some() {
            return false;
        }

        match self.board.card_at(slot) {
            Some(card) => {
                self.opened != Some(slot) && card.is_face_down() && !card.is_flipping()
            }
            None => false,
        }
    }

    /// Whether the hint control may fire: a card is held open and the
    /// session is interactive.
    pub fn hint_ready(&self) -> bool {
        self.opened.is_some()
            && self.can_move
            && !self.paused
            && !self.peeking
            && self.outcome.is_none()
    }

    pub fn select(&mut self, slot: Slot) -> Result<SelectOutcome> {
        let slot = self.board.validate_slot(slot)?;
        if !self.can_select(slot) {
            return Ok(SelectOutcome::Ignored);
        }

        self.can_move = false;
        self.pending = Some(slot);
        if let Some(card) = self.board.card_at_mut(slot) {
            card.begin_flip();
        }

        Ok(match self.opened {
            None => SelectOutcome::FirstFlip(slot),
            Some(open) => SelectOutcome::SecondFlip { open, second: slot },
        })
    }

    /// Completion callback for the flip started by [`select`].
    ///
    /// [`select`]: Self::select
    pub fn flip_finished(&mut self, slot: Slot) -> Result<FlipOutcome> {
        let slot = self.board.validate_slot(slot)?;
        if self.pending != Some(slot) {
            return Err(GameError::UnexpectedEvent);
        }
        self.pending = None;
        self.seen.insert(slot);

        let name = match self.board.card_at_mut(slot) {
            Some(card) => {
                card.settle_face(false);
                card.name()
            }
            None => {
                log::error!("flip settled on vacant slot {}", slot);
                return Err(GameError::MappingDesync);
            }
        };

        let open = match self.opened {
            None => {
                self.opened = Some(slot);
                self.can_move = true;
                return Ok(FlipOutcome::Opened(slot));
            }
            Some(open) => open,
        };

        let open_name = match self.board.card_at(open) {
            Some(card) => card.name(),
            None => {
                log::error!("open card vanished from slot {}", open);
                return Err(GameError::MappingDesync);
            }
        };

        if open_name == name {
            self.board.remove_pair(open, slot)?;
            self.opened = None;
            let won = self.board.is_empty();
            if won {
                self.outcome = Some(RoundOutcome::Won);
            } else {
                self.can_move = true;
            }
            Ok(FlipOutcome::Matched { a: open, b: slot, won })
        } else {
            self.grace = self.grace.saturating_sub(1);
            let life_lost = self.grace == 0;
            if life_lost {
                self.grace = self.config.grace_tries;
                self.lives = self.lives.saturating_sub(1);
            }
            self.resolving = Some((open, slot));
            Ok(FlipOutcome::Mismatched { a: open, b: slot, life_lost })
        }
    }

    /// Starts flipping a mismatched pair back down after the registration
    /// delay. Movement stays disabled until [`mismatch_settled`].
    ///
    /// [`mismatch_settled`]: Self::mismatch_settled
    pub fn begin_unflip(&mut self) -> Result<(Slot, Slot)> {
        let (a, b) = self.resolving.ok_or(GameError::UnexpectedEvent)?;
        self.mark_batch_flipping(&[a, b]);
        Ok((a, b))
    }

    /// Completion callback fired once both reverse flips have settled.
    pub fn mismatch_settled(&mut self) -> Result<MismatchSettled> {
        let (a, b) = self.resolving.take().ok_or(GameError::UnexpectedEvent)?;
        self.settle_card_face(a, true)?;
        self.settle_card_face(b, true)?;
        self.opened = None;

        if self.lives == 0 {
            self.outcome = Some(RoundOutcome::Lost);
            self.can_move = false;
            Ok(MismatchSettled::Lost)
        } else {
            self.can_move = true;
            Ok(MismatchSettled::Continue)
        }
    }

    /// Occupied face-down slots, in grid order.
    pub fn face_down_slots(&self) -> SlotBatch {
        (0..self.board.slot_count())
            .filter(|&slot| {
                self.board
                    .card_at(slot)
                    .is_some_and(|card| card.is_face_down())
            })
            .collect()
    }

    /// Occupied face-up slots other than the one held open, in grid order.
    pub fn face_up_slots_except_open(&self) -> SlotBatch {
        (0..self.board.slot_count())
            .filter(|&slot| {
                self.opened != Some(slot)
                    && self
                        .board
                        .card_at(slot)
                        .is_some_and(|card| !card.is_face_down())
            })
            .collect()
    }

    pub(crate) fn set_peeking(&mut self, peeking: bool) {
        self.peeking = peeking;
    }

    pub(crate) fn mark_batch_flipping(&mut self, slots: &[Slot]) {
        for &slot in slots {
            match self.board.card_at_mut(slot) {
                Some(card) => card.begin_flip(),
                None => log::error!("flip scheduled on vacant slot {}", slot),
            }
        }
    }

    pub(crate) fn settle_card_face(&mut self, slot: Slot, face_down: bool) -> Result<()> {
        match self.board.card_at_mut(slot) {
            Some(card) => {
                card.settle_face(face_down);
                Ok(())
            }
            None => {
                log::error!("face settled on vacant slot {}", slot);
                Err(GameError::MappingDesync)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use hashbrown::HashMap;

    /// Unshuffled layout: slots 2n and 2n+1 hold the same name.
    fn sequential_layout(pairs: u8, cols: u8) -> CardLayout {
        let names = (0..pairs)
            .flat_map(|n| [CardName(n), CardName(n)])
            .collect::<Vec<_>>();
        CardLayout::from_names(names, cols).unwrap()
    }

    fn engine_with(pairs: u8, lives: u8, grace: u8) -> MatchEngine {
        let config = MatchConfig::new_unchecked(pairs, pairs.max(2), lives, grace);
        let layout = sequential_layout(pairs, pairs.max(2));
        let mut engine = MatchEngine::new(config, layout, 1).unwrap();
        engine.arm();
        engine
    }

    fn engine() -> MatchEngine {
        engine_with(8, 3, 2)
    }

    fn flip(engine: &mut MatchEngine, slot: Slot) -> FlipOutcome {
        assert!(engine.select(slot).unwrap().has_update());
        engine.flip_finished(slot).unwrap()
    }

    /// Runs a full mismatch cycle on two different-named slots.
    fn mismatch(engine: &mut MatchEngine, a: Slot, b: Slot) -> MismatchSettled {
        assert!(matches!(flip(engine, a), FlipOutcome::Opened(_)));
        assert!(matches!(flip(engine, b), FlipOutcome::Mismatched { .. }));
        engine.begin_unflip().unwrap();
        engine.mismatch_settled().unwrap()
    }

    #[test]
    fn deal_gives_every_name_exactly_two_cards() {
        let config = MatchConfig::vault();
        let layout = ShuffledLayoutGenerator::new(0xC0F4).generate(&config);
        let engine = MatchEngine::new(config, layout, 1).unwrap();

        let mut multiplicity: HashMap<CardName, u8> = HashMap::new();
        for slot in 0..engine.board().slot_count() {
            let name = engine.board().card_at(slot).unwrap().name();
            *multiplicity.entry(name).or_insert(0) += 1;
        }

        assert_eq!(multiplicity.len(), 8);
        assert!(multiplicity.values().all(|&count| count == 2));
    }

    #[test]
    fn movement_stays_locked_until_armed() {
        let config = MatchConfig::vault();
        let layout = sequential_layout(8, 8);
        let mut engine = MatchEngine::new(config, layout, 1).unwrap();

        assert_eq!(engine.phase(), EnginePhase::Staging);
        assert_eq!(engine.select(0).unwrap(), SelectOutcome::Ignored);

        engine.arm();
        assert_eq!(engine.phase(), EnginePhase::AwaitingFirst);
        assert!(engine.select(0).unwrap().has_update());
    }

    #[test]
    fn first_flip_opens_marks_seen_and_reenables_movement() {
        let mut engine = engine();

        assert_eq!(engine.select(0).unwrap(), SelectOutcome::FirstFlip(0));
        assert!(!engine.can_move());
        assert_eq!(engine.phase(), EnginePhase::Flipping);

        assert_eq!(engine.flip_finished(0).unwrap(), FlipOutcome::Opened(0));
        assert_eq!(engine.opened(), Some(0));
        assert!(engine.can_move());
        assert!(engine.seen(0));
        assert_eq!(engine.phase(), EnginePhase::OneOpen);
    }

    #[test]
    fn selection_gate_rejects_without_mutating() {
        let mut engine = engine();

        // mid-flip: movement is off and the card itself is flipping
        engine.select(0).unwrap();
        assert_eq!(engine.select(2).unwrap(), SelectOutcome::Ignored);
        engine.flip_finished(0).unwrap();

        // the open card and face-up targets are not selectable twice
        assert_eq!(engine.select(0).unwrap(), SelectOutcome::Ignored);
        assert!(!engine.seen(2));

        engine.set_paused(true);
        assert_eq!(engine.select(2).unwrap(), SelectOutcome::Ignored);
        engine.set_paused(false);

        assert_eq!(engine.select(99), Err(GameError::InvalidSlot));
    }

    #[test]
    fn matching_pair_empties_both_mappings() {
        let mut engine = engine();
        let id_a = engine.board().card_at(0).unwrap().id();
        let id_b = engine.board().card_at(1).unwrap().id();

        flip(&mut engine, 0);
        assert_eq!(
            flip(&mut engine, 1),
            FlipOutcome::Matched { a: 0, b: 1, won: false }
        );

        assert!(engine.board().card_at(0).is_none());
        assert!(engine.board().card_at(1).is_none());
        assert_eq!(engine.board().slot_of(id_a), None);
        assert_eq!(engine.board().slot_of(id_b), None);
        assert_eq!(engine.opened(), None);
        assert!(engine.can_move());
        assert_eq!(engine.lives(), 3);
    }

    #[test]
    fn grace_tries_absorb_mismatches_before_a_life_is_spent() {
        let mut engine = engine();

        // try 1: one grace try remains, no life lost
        assert_eq!(mismatch(&mut engine, 0, 2), MismatchSettled::Continue);
        assert_eq!(engine.grace(), 1);
        assert_eq!(engine.lives(), 3);

        // try 2: the counter is spent, resets, and a life goes
        assert_eq!(mismatch(&mut engine, 0, 2), MismatchSettled::Continue);
        assert_eq!(engine.grace(), 2);
        assert_eq!(engine.lives(), 2);

        // try 3: fresh allowance again, no life lost
        assert_eq!(mismatch(&mut engine, 0, 2), MismatchSettled::Continue);
        assert_eq!(engine.grace(), 1);
        assert_eq!(engine.lives(), 2);
    }

    #[test]
    fn mismatch_reports_life_loss_in_the_flip_outcome() {
        let mut engine = engine_with(4, 3, 1);

        flip(&mut engine, 0);
        let outcome = flip(&mut engine, 2);
        assert_eq!(
            outcome,
            FlipOutcome::Mismatched { a: 0, b: 2, life_lost: true }
        );
        assert_eq!(engine.lives(), 2);
    }

    #[test]
    fn lives_never_go_negative_and_zero_is_terminal() {
        let mut engine = engine_with(4, 1, 1);

        assert_eq!(mismatch(&mut engine, 0, 2), MismatchSettled::Lost);
        assert_eq!(engine.lives(), 0);
        assert_eq!(engine.phase(), EnginePhase::Lost);

        // terminal states are sticky
        assert_eq!(engine.select(0).unwrap(), SelectOutcome::Ignored);
        engine.arm();
        assert_eq!(engine.select(0).unwrap(), SelectOutcome::Ignored);
        assert_eq!(engine.lives(), 0);
    }

    #[test]
    fn no_selection_lands_during_the_mismatch_delay_window() {
        let mut engine = engine();

        flip(&mut engine, 0);
        flip(&mut engine, 2);

        // between the mismatch and the reverse flips
        assert_eq!(engine.phase(), EnginePhase::Resolving);
        assert_eq!(engine.select(4).unwrap(), SelectOutcome::Ignored);

        // and between the reverse flips and their settle
        engine.begin_unflip().unwrap();
        assert_eq!(engine.select(4).unwrap(), SelectOutcome::Ignored);

        assert_eq!(engine.mismatch_settled().unwrap(), MismatchSettled::Continue);
        assert!(engine.can_select(4));
    }

    #[test]
    fn mismatched_cards_flip_back_down_on_settle() {
        let mut engine = engine();

        mismatch(&mut engine, 0, 2);

        assert!(engine.board().card_at(0).unwrap().is_face_down());
        assert!(engine.board().card_at(2).unwrap().is_face_down());
        assert_eq!(engine.opened(), None);
        assert!(engine.seen(0));
        assert!(engine.seen(2));
    }

    #[test]
    fn clearing_the_board_wins_with_lives_intact() {
        let mut engine = engine();

        for pair in 0..8u8 {
            let a = pair * 2;
            let b = a + 1;
            flip(&mut engine, a);
            let outcome = flip(&mut engine, b);
            assert_eq!(
                outcome,
                FlipOutcome::Matched { a, b, won: pair == 7 }
            );
        }

        assert_eq!(engine.phase(), EnginePhase::Won);
        assert_eq!(engine.lives(), 3);
        assert!(engine.board().is_empty());
        assert_eq!(engine.select(0).unwrap(), SelectOutcome::Ignored);
    }

    #[test]
    fn stray_completion_callbacks_are_errors() {
        let mut engine = engine();

        assert_eq!(engine.flip_finished(0), Err(GameError::UnexpectedEvent));
        assert_eq!(engine.begin_unflip(), Err(GameError::UnexpectedEvent));
        assert_eq!(engine.mismatch_settled(), Err(GameError::UnexpectedEvent));

        engine.select(0).unwrap();
        assert_eq!(engine.flip_finished(2), Err(GameError::UnexpectedEvent));
    }
}
