use cofrito_core::{AdvanceOutcome, BoxAnchor, DialogueLine, DialogueSequencer, DialogueStep};
use gloo::timers::future::TimeoutFuture;
use yew::prelude::*;

/// How long a line takes to animate out before the next one shows.
pub(crate) const LINE_FADE_MS: u32 = 300;

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct DialogueProps {
    pub script: &'static [DialogueLine],
    /// Fired exactly once when the script is exhausted; the host unmounts
    /// this view in response, which tears down its listener and visuals.
    pub on_complete: Callback<()>,
}

pub(crate) enum DialogueMsg {
    Advance,
    FadeDone,
}

/// Overlay that plays one cutscene script, advancing on click.
pub(crate) struct DialogueView {
    seq: DialogueSequencer,
}

impl Component for DialogueView {
    type Message = DialogueMsg;
    type Properties = DialogueProps;

    fn create(ctx: &Context<Self>) -> Self {
        Self {
            seq: DialogueSequencer::new(ctx.props().script),
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, _old_props: &Self::Properties) -> bool {
        // a new script always gets a fresh sequencer
        self.seq = DialogueSequencer::new(ctx.props().script);
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            DialogueMsg::Advance => match self.seq.advance() {
                AdvanceOutcome::Ignored => false,
                AdvanceOutcome::Transition => {
                    ctx.link().send_future(async {
                        TimeoutFuture::new(LINE_FADE_MS).await;
                        DialogueMsg::FadeDone
                    });
                    true
                }
            },
            DialogueMsg::FadeDone => match self.seq.transition_finished() {
                DialogueStep::Idle => false,
                DialogueStep::Line => true,
                DialogueStep::Finished => {
                    ctx.props().on_complete.emit(());
                    true
                }
            },
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let onclick = ctx.link().callback(|_: MouseEvent| DialogueMsg::Advance);

        let line = match self.seq.current() {
            Some(line) => line,
            None => return html! { <div class="cutscene" {onclick}/> },
        };

        let anchor = match line.speaker.anchor() {
            BoxAnchor::Left => "left",
            BoxAnchor::Right => "right",
            BoxAnchor::Center => "center",
        };
        let class = classes!(
            "speech",
            anchor,
            self.seq.is_transitioning().then_some("fading"),
        );

        html! {
            <div class="cutscene" {onclick}>
                <div {class}>
                    {
                        line.speaker
                            .portrait()
                            .map(|slug| html! { <span class={classes!("portrait", slug)}/> })
                    }
                    <p>{ line.text }</p>
                </div>
            </div>
        }
    }
}
