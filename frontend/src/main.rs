mod animation;
mod api;
mod components;
mod landing;
mod models;
mod reply;
mod session;
mod state;

use std::cell::RefCell;
use std::rc::Rc;

use leptos::mount::{mount_to, mount_to_body};
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use animation::{HeroAnimation, HeroView};
use components::chat::ChatWidget;
use landing::LandingView;
use state::AppState;

/// Root of the chat widget. The hero animation follows the turn state: it
/// shows the thinking asset while a reply is pending.
#[component]
fn App(hero: Rc<RefCell<HeroAnimation>>) -> impl IntoView {
    let state = AppState::provide();

    Effect::new(move |_| {
        let thinking = state.is_sending();
        HeroAnimation::set_thinking(&hero, thinking);
    });

    view! { <ChatWidget /> }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");

    let Some((window, document)) =
        web_sys::window().and_then(|w| w.document().map(|d| (w, d)))
    else {
        log::error!("No window/document, nothing to mount");
        return;
    };

    LandingView::bind(window, document.clone()).install();

    let hero = HeroAnimation::new(HeroView::bind(&document));
    HeroAnimation::start(&hero);

    // The page markup owns layout; the widget mounts into #chat-root when present.
    match document
        .get_element_by_id("chat-root")
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    {
        Some(root) => mount_to(root, move || view! { <App hero=hero /> }).forget(),
        None => mount_to_body(move || view! { <App hero=hero /> }),
    }
}
