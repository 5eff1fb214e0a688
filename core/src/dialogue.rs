use serde::{Deserialize, Serialize};

/// Who is talking. A closed set, so every speaker resolves to a
/// presentation anchor with no missing-key fallback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Player,
    Sidekick,
    Narrator,
    EnemyAsleep,
    EnemyAwake,
}

/// Which side of the screen the speech box hangs from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoxAnchor {
    Left,
    Right,
    Center,
}

impl Speaker {
    pub const fn anchor(self) -> BoxAnchor {
        use Speaker::*;
        match self {
            Player => BoxAnchor::Left,
            Sidekick | EnemyAsleep | EnemyAwake => BoxAnchor::Right,
            Narrator => BoxAnchor::Center,
        }
    }

    /// Portrait asset slug, if the speaker has a face to show.
    pub const fn portrait(self) -> Option<&'static str> {
        use Speaker::*;
        match self {
            Player => Some("player"),
            Sidekick => Some("sidekick"),
            Narrator => None,
            EnemyAsleep => Some("enemy-asleep"),
            EnemyAwake => Some("enemy-awake"),
        }
    }
}

/// One immutable script line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DialogueLine {
    pub speaker: Speaker,
    pub text: &'static str,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// A line transition is already animating out, or the run is over.
    Ignored,
    /// The current line starts animating out; report back with
    /// [`DialogueSequencer::transition_finished`].
    Transition,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DialogueStep {
    /// No transition was outstanding.
    Idle,
    /// The next line is up.
    Line,
    /// The script is exhausted; emitted exactly once per run.
    Finished,
}

/// Plays a fixed script one line at a time, gated on an external advance
/// signal. A second script is always played by a fresh instance.
#[derive(Clone, Debug, PartialEq)]
pub struct DialogueSequencer {
    lines: &'static [DialogueLine],
    index: usize,
    in_transition: bool,
    finished: bool,
}

impl DialogueSequencer {
    pub const fn new(lines: &'static [DialogueLine]) -> Self {
        Self {
            lines,
            index: 0,
            in_transition: false,
            finished: false,
        }
    }

    /// The line being presented, including one that is animating out.
    pub fn current(&self) -> Option<&DialogueLine> {
        if self.finished {
            None
        } else {
            self.lines.get(self.index)
        }
    }

    pub const fn is_transitioning(&self) -> bool {
        self.in_transition
    }

    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Handles one user advance signal. Duplicate signals while a line is
    /// animating out are dropped so no line is skipped.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.in_transition || self.finished {
            return AdvanceOutcome::Ignored;
        }
        self.in_transition = true;
        AdvanceOutcome::Transition
    }

    /// Completion callback for the line-out animation.
    pub fn transition_finished(&mut self) -> DialogueStep {
        if !self.in_transition || self.finished {
            return DialogueStep::Idle;
        }
        self.in_transition = false;
        self.index += 1;
        if self.index >= self.lines.len() {
            self.finished = true;
            DialogueStep::Finished
        } else {
            DialogueStep::Line
        }
    }
}
