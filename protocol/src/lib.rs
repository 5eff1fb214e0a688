//! Wire contract between the web client and the hint relay worker.

use serde::{Deserialize, Serialize};

/// Route the web client posts hint requests to.
pub const HINT_ENDPOINT: &str = "/api/hint";

/// Rolls at or below this value instruct the oracle to tell the truth.
pub const TRUTHFUL_ROLL_MAX: u8 = 70;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintQuery {
    /// Name of the card currently held open.
    pub current_card: String,
    /// One line per slot, see `cofrito_core::encode_board`.
    pub board_encoding: String,
    /// Uniform 1..=100 roll deciding whether the oracle should lie.
    pub hallucination_roll: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HintReply {
    pub success: bool,
    /// A single bracketed slot index, or an error sentinel.
    pub suggestion: String,
}

impl HintReply {
    /// Reply shape for any upstream or relay failure; the client treats it
    /// as "fall back locally", never as an error to surface.
    pub fn unavailable() -> Self {
        Self {
            success: false,
            suggestion: "unavailable".into(),
        }
    }
}

/// System and user messages for the oracle call.
///
/// The lying policy lives here, out of the game core's control: a low
/// roll asks for the seen matching slot, a high roll asks for a wrong but
/// structurally valid one, and an unseen card always gets a not-checked
/// slot regardless of the roll.
pub fn oracle_messages(query: &HintQuery) -> (String, String) {
    let system = format!(
        "You help a player of a memory matching game find the pair of the card \
         they just turned over. The board state lists every slot index with \
         either the card name (already revealed to the player), `not_checked` \
         (never revealed), or `matched (ignore)` (gone or currently open; never \
         suggest these). Apply the hallucination roll: if the roll is {} or \
         lower and the current card's name appears in the board state, answer \
         with that slot's index; if the roll is higher and the name appears, \
         answer with a deliberately wrong slot that is still listed as a card \
         name or `not_checked`; if the name appears nowhere, answer with any \
         `not_checked` slot whatever the roll. Reply with exactly one slot \
         index in square brackets, like [7], and nothing else.",
        TRUTHFUL_ROLL_MAX
    );

    let user = format!(
        "Current card: {}\nHallucination roll: {}\nBoard state:\n{}",
        query.current_card, query.hallucination_roll, query.board_encoding
    );

    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> HintQuery {
        HintQuery {
            current_card: "card-3".into(),
            board_encoding: "0: matched (ignore)\n1: card-3\n2: not_checked\n".into(),
            hallucination_roll: 42,
        }
    }

    #[test]
    fn query_wire_names_are_camel_case() {
        let json = serde_json::to_value(query()).unwrap();
        assert_eq!(json["currentCard"], "card-3");
        assert_eq!(json["hallucinationRoll"], 42);
        assert!(json["boardEncoding"].as_str().unwrap().contains("card-3"));
    }

    #[test]
    fn reply_round_trips() {
        let reply = HintReply {
            success: true,
            suggestion: "[1]".into(),
        };
        let json = serde_json::to_string(&reply).unwrap();
        let back: HintReply = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reply);
    }

    #[test]
    fn failure_replies_never_parse_as_a_slot() {
        let reply = HintReply::unavailable();
        assert!(!reply.success);
        assert!(!reply.suggestion.contains('['));
    }

    #[test]
    fn oracle_messages_embed_the_board_and_the_roll_policy() {
        let (system, user) = oracle_messages(&query());
        assert!(system.contains("70"));
        assert!(system.contains("square brackets"));
        assert!(user.contains("card-3"));
        assert!(user.contains("Hallucination roll: 42"));
        assert!(user.contains("not_checked"));
    }
}
