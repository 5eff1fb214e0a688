use chrono::prelude::*;
use cofrito_core as game;
use cofrito_protocol::HintQuery;
use futures_util::future::join_all;
use gloo::timers::callback::Interval;
use gloo::timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::{Rng, RngExt, SeedableRng};
use serde::{Deserialize, Serialize};
use yew::prelude::*;

use crate::dialogue::DialogueView;
use crate::hint::{self, HintFetch};
use crate::script;
use crate::settings::PauseView;
use crate::utils::*;

/// Card flip animation length; completions are modeled as one timer
/// future per flip.
const FLIP_MS: u32 = 500;
/// Deal-in settle time before movement unlocks.
const DEAL_MS: u32 = 500;
/// How long a mismatch stays visible before the cards turn back.
const MISMATCH_PAUSE_MS: u32 = 500;
const SHAKE_MS: u32 = 300;
const HEART_FADE_MS: u32 = 300;
/// Chance that a player-initiated reveal briefly shows a wrong face.
/// Peek reveals never do.
const DECOY_CHANCE: f64 = 0.15;

fn utc_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).unwrap()
}

/// A face some card may lie with mid-flip: always a different name from
/// the same alphabet, chosen uniformly.
fn decoy_name<R: Rng + ?Sized>(rng: &mut R, actual: game::CardName, pairs: u8) -> game::CardName {
    game::CardName((actual.index() + rng.random_range(1..pairs)) % pairs)
}

/// One round of the matching game plus its host-side bookkeeping. Built
/// fresh at round start, dropped whole on restart; nothing outlives its
/// round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct MatchSession {
    pub engine: game::MatchEngine,
    pub peek: game::PeekController,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub move_count: u32,
}

impl MatchSession {
    fn new(seed: u64, nonce: u32) -> Self {
        use game::LayoutGenerator;

        let config = game::MatchConfig::vault();
        let layout = game::ShuffledLayoutGenerator::new(seed).generate(&config);
        let engine =
            game::MatchEngine::new(config, layout, nonce).expect("generated layout fits the config");

        Self {
            engine,
            peek: game::PeekController::new(),
            started_at: None,
            ended_at: None,
            move_count: 0,
        }
    }

    fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        if let Some(started_at) = self.started_at {
            (self.ended_at.unwrap_or(now) - started_at)
                .num_seconds()
                .max(0) as u32
        } else {
            0
        }
    }

    fn on_successful_move(&mut self, now: DateTime<Utc>) {
        self.move_count = self.move_count.saturating_add(1);

        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    fn mark_ended(&mut self, now: DateTime<Utc>) {
        if self.ended_at.is_none() {
            self.ended_at = Some(now);
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Stage {
    Intro,
    Playing,
    Outro { won: bool },
    Ended { won: bool },
}

#[derive(Clone, Debug, PartialEq)]
enum ViewCard {
    Gone,
    Down,
    Showing { name: game::CardName, flipping: bool },
}

#[derive(Properties, Clone, PartialEq)]
struct CardProps {
    slot: game::Slot,
    card: ViewCard,
    #[prop_or_default]
    highlighted: bool,
    #[prop_or_default]
    locked: bool,
    onselect: Callback<game::Slot>,
}

#[function_component(CardView)]
fn card_component(props: &CardProps) -> Html {
    let CardProps {
        slot,
        card,
        highlighted,
        locked,
        onselect,
    } = props.clone();

    let mut class = classes!(
        "card",
        match card {
            ViewCard::Gone => classes!("gone"),
            ViewCard::Down => classes!("down"),
            ViewCard::Showing { name, flipping } => {
                let mut showing = classes!("up", format!("face-{}", name.index()));
                if flipping {
                    showing.push("flipping");
                }
                showing
            }
        }
    );
    if highlighted {
        class.push("hint");
    }
    if locked {
        class.push("locked");
    }

    let onclick = Callback::from(move |_: MouseEvent| onselect.emit(slot));

    html! {
        <td {class} {onclick}/>
    }
}

pub(crate) enum Msg {
    IntroDone,
    RoundArmed,
    CardSelected(game::Slot),
    FlipSettled(game::Slot),
    MismatchPause,
    MismatchSettled,
    ShakeDone,
    HeartFaded,
    PeekToggled,
    PeekSettled,
    HintRequested,
    HintResolved { epoch: u32, fetch: HintFetch },
    HintExpired { epoch: u32 },
    OutroDone,
    Restart,
    TogglePause,
    UpdateTime,
}

#[derive(Properties, Clone, Debug, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[prop_or_default]
    pub seed: Option<u64>,
}

/// The vault scene: intro cutscene, the matching round, outro cutscene,
/// terminal banner. All engine mutations happen in `update`, either from
/// an input event or from a timer future standing in for an animation
/// completion.
pub(crate) struct GameView {
    stage: Stage,
    session: Option<MatchSession>,
    rng: SmallRng,
    round: u32,
    decoy: Option<(game::Slot, game::CardName)>,
    shaking: bool,
    heart_fading: bool,
    hint_busy: bool,
    hint_epoch: u32,
    highlight: Option<game::Slot>,
    paused: bool,
    prev_time: u32,
    _timer_interval: Interval,
}

impl GameView {
    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(500, move || link.send_message(Msg::UpdateTime))
    }

    fn elapsed(&self) -> u32 {
        self.session
            .as_ref()
            .map(|session| session.elapsed_secs(utc_now()))
            .unwrap_or(0)
    }

    fn state_class(&self) -> Classes {
        classes!(match self.stage {
            Stage::Intro => "not-started",
            Stage::Playing => match self.session.as_ref().and_then(|s| s.engine.outcome()) {
                None => "in-progress",
                Some(game::RoundOutcome::Won) => "win",
                Some(game::RoundOutcome::Lost) => "lose",
            },
            Stage::Outro { won: true } | Stage::Ended { won: true } => "win",
            Stage::Outro { won: false } | Stage::Ended { won: false } => "lose",
        })
    }

    fn view_card(&self, slot: game::Slot) -> ViewCard {
        let Some(session) = self.session.as_ref() else {
            return ViewCard::Gone;
        };

        match session.engine.board().card_at(slot) {
            None => ViewCard::Gone,
            Some(card) if card.is_face_down() && !card.is_flipping() => ViewCard::Down,
            Some(card) => {
                let name = match self.decoy {
                    // a reveal in progress may lie; a settled face never does
                    Some((decoy_slot, decoy)) if decoy_slot == slot && card.is_face_down() => decoy,
                    _ => card.name(),
                };
                ViewCard::Showing {
                    name,
                    flipping: card.is_flipping(),
                }
            }
        }
    }

    fn view_hearts(&self) -> Html {
        let lives = self.session.as_ref().map_or(0, |s| s.engine.lives());
        html! {
            <>
                { for (0..lives).map(|_| html! { <span class="heart"/> }) }
                { self.heart_fading.then_some(html! { <span class="heart fading"/> }) }
            </>
        }
    }

    fn view_controls(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let session = self.session.as_ref();

        let peeking = session.is_some_and(|s| s.engine.is_peeking());
        let peek_locked =
            session.is_none_or(|s| s.peek.is_batch_in_flight() || !s.engine.can_move());
        let hint_ready = !self.hint_busy && session.is_some_and(|s| s.engine.hint_ready());
        let grace = session.map_or(0, |s| s.engine.grace());
        let moves = session.map_or(0, |s| s.move_count);

        html! {
            <section class="controls">
                <button
                    class={classes!("peek", peeking.then_some("active"))}
                    disabled={peek_locked}
                    onclick={link.callback(|_| Msg::PeekToggled)}>
                    { if peeking { "Exit Peek" } else { "Peek" } }
                </button>
                <button
                    class={classes!("oracle", self.hint_busy.then_some("busy"))}
                    disabled={!hint_ready}
                    onclick={link.callback(|_| Msg::HintRequested)}>
                    { if self.hint_busy { "Asking..." } else { "Hint" } }
                </button>
                <aside class="grace">
                    { for (0..grace).map(|_| html! { <span class="pip"/> }) }
                </aside>
                <aside class="moves">{ format_for_counter(moves as i32) }</aside>
            </section>
        }
    }

    fn view_board(&self, ctx: &Context<Self>) -> Html {
        let Some(session) = self.session.as_ref() else {
            return html! { <table class="board"/> };
        };
        let board = session.engine.board();
        let (cols, rows) = (board.cols(), board.rows());

        html! {
            <table class="board">
                {
                    for (0..rows).map(|row| html! {
                        <tr>
                            {
                                for (0..cols).map(|col| {
                                    let slot = row * cols + col;
                                    let card = self.view_card(slot);
                                    let highlighted = self.highlight == Some(slot);
                                    let locked = !session.engine.can_select(slot);
                                    let onselect = ctx.link().callback(Msg::CardSelected);
                                    html! {
                                        <CardView {slot} {card} {highlighted} {locked} {onselect}/>
                                    }
                                })
                            }
                        </tr>
                    })
                }
            </table>
        }
    }

    fn view_overlay(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        match self.stage {
            Stage::Intro => html! {
                <DialogueView
                    script={script::INTRO}
                    on_complete={link.callback(|_| Msg::IntroDone)}/>
            },
            Stage::Outro { won } => {
                let script = if won { script::VICTORY } else { script::DEFEAT };
                html! {
                    <DialogueView {script} on_complete={link.callback(|_| Msg::OutroDone)}/>
                }
            }
            Stage::Ended { won } => {
                let (class, text) = if won {
                    ("banner win", "VAULT CRACKED\nClick to play again")
                } else {
                    ("banner lose", "ALARM RAISED\nClick to try again")
                };
                html! {
                    <div {class} onclick={link.callback(|_| Msg::Restart)}>
                        <p>{ text }</p>
                    </div>
                }
            }
            Stage::Playing => html! {},
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let seed = ctx.props().seed.unwrap_or_else(js_random_seed);

        Self {
            stage: Stage::Intro,
            session: None,
            rng: SmallRng::seed_from_u64(seed),
            round: 1,
            decoy: None,
            shaking: false,
            heart_fading: false,
            hint_busy: false,
            hint_epoch: 0,
            highlight: None,
            paused: false,
            prev_time: 0,
            _timer_interval: GameView::create_timer(ctx),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::IntroDone => {
                let seed = self.rng.random();
                self.session = Some(MatchSession::new(seed, self.round));
                self.stage = Stage::Playing;
                ctx.link().send_future(async {
                    TimeoutFuture::new(DEAL_MS).await;
                    Msg::RoundArmed
                });
                true
            }
            Msg::RoundArmed => match self.session.as_mut() {
                Some(session) => {
                    session.engine.arm();
                    true
                }
                None => false,
            },
            Msg::CardSelected(slot) => {
                if self.stage != Stage::Playing {
                    return false;
                }
                let Some(session) = self.session.as_mut() else {
                    return false;
                };

                let outcome = match session.engine.select(slot) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        log::debug!("selection on slot {} rejected: {}", slot, err);
                        return false;
                    }
                };
                if !outcome.has_update() {
                    return false;
                }
                log::debug!("flip slot {:?}", outcome);
                session.on_successful_move(utc_now());

                let pairs = session.engine.config().pairs;
                if pairs > 1 && self.rng.random_bool(DECOY_CHANCE) {
                    if let Some(card) = session.engine.board().card_at(slot) {
                        self.decoy = Some((slot, decoy_name(&mut self.rng, card.name(), pairs)));
                    }
                }

                ctx.link().send_future(async move {
                    TimeoutFuture::new(FLIP_MS).await;
                    Msg::FlipSettled(slot)
                });
                true
            }
            Msg::FlipSettled(slot) => {
                if self.decoy.is_some_and(|(decoy_slot, _)| decoy_slot == slot) {
                    self.decoy = None;
                }
                let Some(session) = self.session.as_mut() else {
                    return false;
                };

                let outcome = match session.engine.flip_finished(slot) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        log::debug!("dropping stale flip completion: {}", err);
                        return false;
                    }
                };
                match outcome {
                    game::FlipOutcome::Opened(_) => true,
                    game::FlipOutcome::Matched { won, .. } => {
                        if won {
                            log::info!("match game won after {} moves", session.move_count);
                            session.mark_ended(utc_now());
                            self.stage = Stage::Outro { won: true };
                        }
                        true
                    }
                    game::FlipOutcome::Mismatched { life_lost, .. } => {
                        self.shaking = true;
                        if life_lost {
                            self.heart_fading = true;
                            ctx.link().send_future(async {
                                TimeoutFuture::new(HEART_FADE_MS).await;
                                Msg::HeartFaded
                            });
                        }
                        ctx.link().send_future(async {
                            TimeoutFuture::new(SHAKE_MS).await;
                            Msg::ShakeDone
                        });
                        ctx.link().send_future(async {
                            TimeoutFuture::new(MISMATCH_PAUSE_MS).await;
                            Msg::MismatchPause
                        });
                        true
                    }
                }
            }
            Msg::MismatchPause => {
                let Some(session) = self.session.as_mut() else {
                    return false;
                };
                match session.engine.begin_unflip() {
                    Ok((_, _)) => {
                        // the pair flips back concurrently; the engine settles
                        // only after both completions
                        ctx.link().send_future(async {
                            join_all([TimeoutFuture::new(FLIP_MS), TimeoutFuture::new(FLIP_MS)])
                                .await;
                            Msg::MismatchSettled
                        });
                        true
                    }
                    Err(err) => {
                        log::debug!("dropping stale mismatch pause: {}", err);
                        false
                    }
                }
            }
            Msg::MismatchSettled => {
                let Some(session) = self.session.as_mut() else {
                    return false;
                };
                match session.engine.mismatch_settled() {
                    Ok(game::MismatchSettled::Continue) => true,
                    Ok(game::MismatchSettled::Lost) => {
                        log::info!("match game lost after {} moves", session.move_count);
                        session.mark_ended(utc_now());
                        self.stage = Stage::Outro { won: false };
                        true
                    }
                    Err(err) => {
                        log::debug!("dropping stale mismatch settle: {}", err);
                        false
                    }
                }
            }
            Msg::ShakeDone => {
                self.shaking = false;
                true
            }
            Msg::HeartFaded => {
                self.heart_fading = false;
                true
            }
            Msg::PeekToggled => {
                let Some(session) = self.session.as_mut() else {
                    return false;
                };
                match session.peek.toggle(&mut session.engine) {
                    game::PeekToggle::Ignored => false,
                    game::PeekToggle::Entering(size) | game::PeekToggle::Exiting(size) => {
                        if size > 0 {
                            ctx.link().send_future(async move {
                                join_all((0..size).map(|_| TimeoutFuture::new(FLIP_MS))).await;
                                Msg::PeekSettled
                            });
                        }
                        true
                    }
                }
            }
            Msg::PeekSettled => {
                let Some(session) = self.session.as_mut() else {
                    return false;
                };
                match session.peek.settle(&mut session.engine) {
                    Ok(()) => true,
                    Err(err) => {
                        log::debug!("dropping stale peek settle: {}", err);
                        false
                    }
                }
            }
            Msg::HintRequested => {
                let Some(session) = self.session.as_ref() else {
                    return false;
                };
                if self.hint_busy || !session.engine.hint_ready() {
                    return false;
                }
                let current = session
                    .engine
                    .opened()
                    .and_then(|slot| session.engine.board().card_at(slot));
                let Some(current) = current else {
                    return false;
                };

                self.hint_busy = true;
                // a new request always clears the previous highlight
                self.highlight = None;
                self.hint_epoch += 1;
                let epoch = self.hint_epoch;

                let query = HintQuery {
                    current_card: current.name().to_string(),
                    board_encoding: game::encode_board(&session.engine),
                    hallucination_roll: game::hallucination_roll(&mut self.rng),
                };

                ctx.link().send_future(async move {
                    let fetch = hint::request_hint(query).await;
                    Msg::HintResolved { epoch, fetch }
                });
                true
            }
            Msg::HintResolved { epoch, fetch } => {
                if epoch != self.hint_epoch {
                    log::debug!("dropping hint resolution from a previous round");
                    return false;
                }
                self.hint_busy = false;

                let Some(session) = self.session.as_ref() else {
                    return true;
                };
                let raw = match &fetch {
                    HintFetch::Reply(suggestion) => Some(suggestion.as_str()),
                    HintFetch::Failed => None,
                };
                match game::resolve_suggestion(&session.engine, raw, &mut self.rng) {
                    Some(slot) => {
                        self.highlight = Some(slot);
                        ctx.link().send_future(async move {
                            TimeoutFuture::new(hint::HIGHLIGHT_MS).await;
                            Msg::HintExpired { epoch }
                        });
                    }
                    None => log::debug!("no hintable slots remain"),
                }
                true
            }
            Msg::HintExpired { epoch } => {
                if epoch == self.hint_epoch && self.highlight.is_some() {
                    self.highlight = None;
                    true
                } else {
                    false
                }
            }
            Msg::OutroDone => match self.stage {
                Stage::Outro { won } => {
                    self.stage = Stage::Ended { won };
                    true
                }
                _ => false,
            },
            Msg::Restart => {
                self.round += 1;
                self.hint_epoch += 1;
                self.session = None;
                self.decoy = None;
                self.highlight = None;
                self.hint_busy = false;
                self.shaking = false;
                self.heart_fading = false;
                self.paused = false;
                self.stage = Stage::Intro;
                true
            }
            Msg::TogglePause => {
                self.paused = !self.paused;
                if let Some(session) = self.session.as_mut() {
                    session.engine.set_paused(self.paused);
                }
                true
            }
            Msg::UpdateTime => {
                let time = self.elapsed();
                if self.prev_time != time {
                    self.prev_time = time;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        let onkeydown = link
            .batch_callback(|e: KeyboardEvent| (e.key() == "q").then_some(Msg::TogglePause));
        let cb_restart = link.callback(|e: MouseEvent| {
            e.stop_propagation();
            Msg::Restart
        });
        let cb_pause = link.callback(|_| Msg::TogglePause);

        html! {
            <div
                class={classes!("cofrito", self.shaking.then_some("shake"))}
                tabindex="0"
                {onkeydown}
                oncontextmenu={Callback::from(|e: MouseEvent| e.prevent_default())}>
                <small onclick={cb_pause.clone()}>{"···"}</small>
                <nav>
                    <aside class="hearts">{ self.view_hearts() }</aside>
                    <span><button class={self.state_class()} onclick={cb_restart}/></span>
                    <aside class="clock">{ format_for_counter(self.elapsed() as i32) }</aside>
                </nav>
                { self.view_controls(ctx) }
                { self.view_board(ctx) }
                { self.view_overlay(ctx) }
                <PauseView
                    open={self.paused}
                    on_resume={link.callback(|_| Msg::TogglePause)}
                    on_restart={link.callback(|_| Msg::Restart)}/>
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(0).unwrap()
    }

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(secs * 1000).unwrap()
    }

    #[test]
    fn fresh_sessions_deal_the_vault_board() {
        let session = MatchSession::new(11, 1);
        assert_eq!(session.engine.board().slot_count(), 16);
        assert_eq!(session.engine.lives(), 3);
        assert_eq!(session.engine.grace(), 2);
        assert!(!session.engine.can_move());
    }

    #[test]
    fn rounds_never_share_card_identities() {
        let first = MatchSession::new(11, 1);
        let second = MatchSession::new(11, 2);

        for slot in 0..first.engine.board().slot_count() {
            assert_ne!(
                first.engine.board().card_at(slot).unwrap().id(),
                second.engine.board().card_at(slot).unwrap().id(),
            );
        }
    }

    #[test]
    fn session_clock_starts_on_the_first_move_and_stops_at_the_end() {
        let mut session = MatchSession::new(11, 1);
        assert_eq!(session.elapsed_secs(t(100)), 0);

        session.on_successful_move(t0());
        session.on_successful_move(t(5));
        assert_eq!(session.move_count, 2);
        assert_eq!(session.started_at, Some(t0()));

        session.mark_ended(t(30));
        session.mark_ended(t(99));
        assert_eq!(session.elapsed_secs(t(100)), 30);
    }

    #[test]
    fn decoys_never_show_the_real_face() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..100 {
            let actual = game::CardName(rng.random_range(0..8));
            let decoy = decoy_name(&mut rng, actual, 8);
            assert_ne!(decoy, actual);
            assert!(decoy.index() < 8);
        }
    }
}
