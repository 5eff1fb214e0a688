use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum BatchKind {
    Enter,
    Exit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct InFlight {
    kind: BatchKind,
    batch: SlotBatch,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PeekToggle {
    /// The toggle failed its guard; nothing changed.
    Ignored,
    /// Revealing every face-down card; carries the batch size.
    Entering(usize),
    /// Hiding every face-up card except the open one; carries the batch size.
    Exiting(usize),
}

impl PeekToggle {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Serializes reveal-all toggles: at most one animation batch in flight,
/// and a fresh toggle is refused until the previous batch settles.
///
/// Joining the per-card completions is the host's job (one future per
/// flip, awaited together), so completions may arrive in any order; the
/// controller only guards, hands out batches, and settles them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeekController {
    in_flight: Option<InFlight>,
}

impl PeekController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_batch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Slots whose flip animations the host still has to run for the
    /// current toggle.
    pub fn pending_batch(&self) -> Option<&SlotBatch> {
        self.in_flight.as_ref().map(|in_flight| &in_flight.batch)
    }

    /// Enters or exits peek mode. An empty batch settles synchronously
    /// since no completion will ever fire for it.
    pub fn toggle(&mut self, engine: &mut MatchEngine) -> PeekToggle {
        if self.in_flight.is_some()
            || !engine.can_move()
            || engine.is_paused()
            || engine.is_finished()
        {
            return PeekToggle::Ignored;
        }

        let (kind, batch) = if engine.is_peeking() {
            (BatchKind::Exit, engine.face_up_slots_except_open())
        } else {
            // peek must show true identity, so the gate goes up before any
            // card starts moving
            engine.set_peeking(true);
            (BatchKind::Enter, engine.face_down_slots())
        };

        let size = batch.len();
        engine.mark_batch_flipping(&batch);
        self.in_flight = Some(InFlight { kind, batch });

        if size == 0 {
            let _ = self.settle(engine);
        }

        match kind {
            BatchKind::Enter => PeekToggle::Entering(size),
            BatchKind::Exit => PeekToggle::Exiting(size),
        }
    }

    /// Applies the batch once every one of its flip animations reported
    /// completion, clearing the in-flight guard.
    pub fn settle(&mut self, engine: &mut MatchEngine) -> Result<()> {
        let InFlight { kind, batch } = self.in_flight.take().ok_or(GameError::UnexpectedEvent)?;

        let face_down = matches!(kind, BatchKind::Exit);
        for &slot in &batch {
            engine.settle_card_face(slot, face_down)?;
        }
        if face_down {
            engine.set_peeking(false);
        }
        Ok(())
    }
}
