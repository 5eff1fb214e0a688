use yew::prelude::*;

use crate::theme::Theme;
use crate::utils::Modal;

#[derive(Properties, PartialEq)]
pub(crate) struct PauseProps {
    #[prop_or_default]
    pub open: bool,
    pub on_resume: Callback<()>,
    pub on_restart: Callback<()>,
}

/// Pause dialog: resume, restart, and the theme switcher.
#[function_component]
pub(crate) fn PauseView(props: &PauseProps) -> Html {
    let on_resume = {
        let on_resume = props.on_resume.clone();
        Callback::from(move |_: MouseEvent| on_resume.emit(()))
    };
    let on_restart = {
        let on_restart = props.on_restart.clone();
        Callback::from(move |_: MouseEvent| on_restart.emit(()))
    };
    let pick_theme = |theme: Option<Theme>| {
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            Theme::apply(theme);
        })
    };

    html! {
        <Modal>
            <dialog id="settings" open={props.open}>
                <article>
                    <h2>{"Paused"}</h2>
                    <footer>
                        <button onclick={on_resume}>{"Resume"}</button>
                        <button onclick={on_restart}>{"Restart"}</button>
                    </footer>
                    <ul>
                        <li><a href="#" onclick={pick_theme(None)}>{"Auto"}</a></li>
                        <li><a href="#" onclick={pick_theme(Some(Theme::Light))}>{"Light"}</a></li>
                        <li><a href="#" onclick={pick_theme(Some(Theme::Dark))}>{"Dark"}</a></li>
                    </ul>
                </article>
            </dialog>
        </Modal>
    }
}
