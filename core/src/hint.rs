use alloc::string::String;
use core::fmt::Write as _;

use rand::{Rng, RngExt};

use crate::*;

/// Uniform roll in 1..=100 deciding whether the oracle is told to lie.
pub fn hallucination_roll<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random_range(1..=100)
}

/// Encodes the board for the oracle, one line per slot.
///
/// Removed slots and the slot currently held open are excluded from
/// candidacy; a slot discloses its name only once a human flip has
/// revealed it.
pub fn encode_board(engine: &MatchEngine) -> String {
    let mut out = String::new();
    for slot in 0..engine.board().slot_count() {
        let _ = write!(out, "{}: ", slot);
        match engine.board().card_at(slot) {
            None => {
                let _ = writeln!(out, "matched (ignore)");
            }
            Some(_) if engine.opened() == Some(slot) => {
                let _ = writeln!(out, "matched (ignore)");
            }
            Some(card) if engine.seen(slot) => {
                let _ = writeln!(out, "{}", card.name());
            }
            Some(_) => {
                let _ = writeln!(out, "not_checked");
            }
        }
    }
    out
}

/// Slots a suggestion may legally point at: unmatched and not held open.
pub fn candidate_slots(engine: &MatchEngine) -> SlotBatch {
    (0..engine.board().slot_count())
        .filter(|&slot| engine.opened() != Some(slot) && engine.board().card_at(slot).is_some())
        .collect()
}

/// Extracts the first bracketed integer from a raw oracle reply.
pub fn parse_suggestion(raw: &str) -> Option<Slot> {
    let mut rest = raw;
    while let Some(start) = rest.find('[') {
        rest = &rest[start + 1..];
        let end = rest.find(']')?;
        if let Ok(slot) = rest[..end].trim().parse::<Slot>() {
            return Some(slot);
        }
        rest = &rest[end + 1..];
    }
    None
}

fn is_valid_suggestion(engine: &MatchEngine, slot: Slot) -> bool {
    slot < engine.board().slot_count()
        && engine.opened() != Some(slot)
        && engine.board().card_at(slot).is_some()
}

/// Turns a raw oracle reply into a slot to highlight.
///
/// Absent, unparsable, out-of-range, and already-matched replies all fall
/// back to a uniform choice among the valid slots; the player never sees
/// an error. `None` means there is nothing left to suggest at all.
pub fn resolve_suggestion<R: Rng + ?Sized>(
    engine: &MatchEngine,
    raw: Option<&str>,
    rng: &mut R,
) -> Option<Slot> {
    if let Some(raw) = raw {
        if let Some(slot) = parse_suggestion(raw) {
            if is_valid_suggestion(engine, slot) {
                return Some(slot);
            }
            log::debug!("oracle suggested unusable slot {}, falling back", slot);
        }
    }

    let candidates = candidate_slots(engine);
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}
