//! Cutscene scripts for the vault scene. Fixed, ordered, immutable; the
//! sequencer in the core plays them one line per click.

use cofrito_core::{DialogueLine, Speaker};

const fn line(speaker: Speaker, text: &'static str) -> DialogueLine {
    DialogueLine { speaker, text }
}

pub(crate) const INTRO: &[DialogueLine] = &[
    line(
        Speaker::Narrator,
        "You and Sidekick slip into the abandoned bank. Somewhere behind that \
         vault door sits the memory chip Sidekick lost.",
    ),
    line(
        Speaker::Sidekick,
        "My radar is sure of it. The chip is inside the vault.",
    ),
    line(
        Speaker::Player,
        "And how do we get past that mean-looking guard robot?",
    ),
    line(Speaker::EnemyAsleep, "ZzZzZzz..."),
    line(
        Speaker::Sidekick,
        "It's asleep. If we are quiet, we can work the lock right under its nose.",
    ),
    line(
        Speaker::Player,
        "Then it's now or never. Help me match the lock glyphs.",
    ),
    line(
        Speaker::Sidekick,
        "I'll try, but without my memory chip my accuracy is poor. I might \
         hallucinate at times. And careful: too many wrong tries and the alarm \
         goes off.",
    ),
    line(Speaker::Narrator, "Click to begin..."),
];

pub(crate) const VICTORY: &[DialogueLine] = &[
    line(Speaker::Player, "That was the last pair. Did it open?"),
    line(
        Speaker::Sidekick,
        "It did! I can feel the chip from here. Grab it and I'll plot us a way \
         out before anything wakes up.",
    ),
    line(Speaker::Sidekick, "Follow me!"),
];

pub(crate) const DEFEAT: &[DialogueLine] = &[
    line(Speaker::EnemyAsleep, "zzzZZZzz..."),
    line(
        Speaker::Narrator,
        "Too many failed tries. The vault's intruder alert rings out.",
    ),
    line(Speaker::EnemyAwake, "Huh?! Who's there?!"),
    line(Speaker::Player, "Oh no. Time to go!"),
    line(Speaker::Sidekick, "Right behind you, captain."),
    line(Speaker::EnemyAwake, "STOP! YOU CANNOT OUTRUN ME!"),
    line(Speaker::Player, "AAAAAAAAAA"),
];
