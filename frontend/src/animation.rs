//! Lottie hero animation.
//!
//! [`LoadTracker`] is the pure state machine: `Idle → Loading → {Playing, Fallback}`,
//! re-entered on every asset swap. Each load gets a sequence number and only
//! the newest one may settle the phase, so a slow `animation.json` cannot
//! clobber a `thinking.json` started after it.
//!
//! [`LottieHandle`] owns one `lottie.loadAnimation` instance; dropping it
//! destroys the instance and its listeners.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

pub const HERO_ASSET: &str = "animation.json";
pub const THINKING_ASSET: &str = "thinking.json";

const UNSUPPORTED_TEXT: &str = "Seu navegador não suporta a animação interativa.";
const LOAD_FAILED_TEXT: &str =
    "Não foi possível carregar a animação. Verifique se o arquivo animation.json está na pasta \"public\".";

#[wasm_bindgen]
extern "C" {
    /// The global `lottie` object from lottie-web.
    #[derive(Clone)]
    pub type LottiePlayer;

    pub type AnimationItem;

    #[wasm_bindgen(method, js_name = loadAnimation)]
    fn load_animation(this: &LottiePlayer, params: &JsValue) -> AnimationItem;

    #[wasm_bindgen(method, js_name = addEventListener)]
    fn add_event_listener(this: &AnimationItem, name: &str, callback: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn play(this: &AnimationItem);

    #[wasm_bindgen(method)]
    fn destroy(this: &AnimationItem);
}

/// `window.lottie`, if the library script loaded.
pub fn lottie_player() -> Option<LottiePlayer> {
    let window = web_sys::window()?;
    let value = js_sys::Reflect::get(&window, &JsValue::from_str("lottie")).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    Some(value.unchecked_into())
}

// ── Pure state ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeroPhase {
    /// Static fallback image shown, nothing requested yet.
    #[default]
    Idle,
    Loading,
    Playing,
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    pub asset: &'static str,
}

#[derive(Debug, Default)]
pub struct LoadTracker {
    seq: u64,
    phase: HeroPhase,
    playing_asset: Option<&'static str>,
    /// Set by the first successful load and never cleared.
    has_played: bool,
}

impl LoadTracker {
    pub fn phase(&self) -> HeroPhase {
        self.phase
    }

    pub fn playing_asset(&self) -> Option<&'static str> {
        self.playing_asset
    }

    /// Starts a load, superseding any load still in flight.
    pub fn begin(&mut self, asset: &'static str) -> LoadTicket {
        self.seq += 1;
        self.phase = HeroPhase::Loading;
        self.playing_asset = None;
        LoadTicket { seq: self.seq, asset }
    }

    /// Whether `#heroAnimationFallback` should be on screen. Once something
    /// has played, swaps keep it hidden while the next asset loads.
    pub fn fallback_visible(&self) -> bool {
        match self.phase {
            HeroPhase::Idle | HeroPhase::Loading => !self.has_played,
            HeroPhase::Playing => false,
            HeroPhase::Fallback => true,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.seq == self.seq
    }

    /// Settles `ticket`. Returns `false` and changes nothing when a newer
    /// load has been started since.
    pub fn finish(&mut self, ticket: LoadTicket, loaded: bool) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        if loaded {
            self.phase = HeroPhase::Playing;
            self.playing_asset = Some(ticket.asset);
            self.has_played = true;
        } else {
            self.phase = HeroPhase::Fallback;
        }
        true
    }

    /// Marks the animation as impossible (no lottie on the page).
    pub fn unsupported(&mut self) {
        self.seq += 1;
        self.phase = HeroPhase::Fallback;
        self.playing_asset = None;
    }
}

// ── Owned lottie instance ────────────────────────────────────────────────────

pub struct LottieHandle {
    item: AnimationItem,
    ready: Shared<LocalBoxFuture<'static, bool>>,
    // Held so the JS callbacks stay valid for the instance's lifetime.
    _on_loaded: Closure<dyn FnMut()>,
    _on_failed: Closure<dyn FnMut()>,
}

impl LottieHandle {
    pub fn create(player: &LottiePlayer, container: &HtmlElement, asset: &str) -> Self {
        let params = js_sys::Object::new();
        let settings = js_sys::Object::new();
        let set = |obj: &js_sys::Object, key: &str, value: &JsValue| {
            let _ = js_sys::Reflect::set(obj, &JsValue::from_str(key), value);
        };
        set(&settings, "preserveAspectRatio", &JsValue::from_str("xMidYMid meet"));
        set(&params, "container", container.as_ref());
        set(&params, "renderer", &JsValue::from_str("svg"));
        set(&params, "loop", &JsValue::TRUE);
        set(&params, "autoplay", &JsValue::TRUE);
        set(&params, "path", &JsValue::from_str(asset));
        set(&params, "rendererSettings", settings.as_ref());

        let item = player.load_animation(params.as_ref());

        let (tx, rx) = oneshot::channel::<bool>();
        let tx = Rc::new(RefCell::new(Some(tx)));
        let settle = move |ok: bool| {
            let tx = tx.clone();
            move || {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(ok);
                }
            }
        };
        let on_loaded = Closure::<dyn FnMut()>::new(settle(true));
        let on_failed = Closure::<dyn FnMut()>::new(settle(false));
        item.add_event_listener("DOMLoaded", on_loaded.as_ref().unchecked_ref());
        item.add_event_listener("data_failed", on_failed.as_ref().unchecked_ref());

        let ready = rx.map(|r| r.unwrap_or(false)).boxed_local().shared();

        Self { item, ready, _on_loaded: on_loaded, _on_failed: on_failed }
    }

    /// Resolves once: `true` when the animation rendered, `false` when it
    /// failed or the handle was dropped first.
    pub fn ready(&self) -> Shared<LocalBoxFuture<'static, bool>> {
        self.ready.clone()
    }

    pub fn play(&self) {
        self.item.play();
    }
}

impl Drop for LottieHandle {
    fn drop(&mut self) {
        self.item.destroy();
    }
}

// ── DOM controller ───────────────────────────────────────────────────────────

/// Hero elements, looked up once. Any of them may be absent from a page.
pub struct HeroView {
    pub animation: Option<HtmlElement>,
    pub fallback: Option<HtmlElement>,
    pub content: Option<HtmlElement>,
    pub container: Option<HtmlElement>,
    pub more_button: Option<HtmlElement>,
}

impl HeroView {
    pub fn bind(document: &web_sys::Document) -> Self {
        let by_id = |id: &str| {
            document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        };
        Self {
            animation: by_id("heroAnimation"),
            fallback: by_id("heroAnimationFallback"),
            content: by_id("heroContent"),
            container: by_id("heroContainer"),
            more_button: by_id("saibaMaisBtn"),
        }
    }
}

pub struct HeroAnimation {
    view: HeroView,
    player: Option<LottiePlayer>,
    tracker: LoadTracker,
    current: Option<LottieHandle>,
    thinking: bool,
    /// Markup text of the fallback element, restored while a first load is pending.
    placeholder: Option<String>,
}

impl HeroAnimation {
    pub fn new(view: HeroView) -> Rc<RefCell<Self>> {
        let placeholder = view.fallback.as_ref().and_then(|el| el.text_content());
        Rc::new(RefCell::new(Self {
            view,
            placeholder,
            player: lottie_player(),
            tracker: LoadTracker::default(),
            current: None,
            thinking: false,
        }))
    }

    /// Kicks off the first load and wires the "Saiba mais" button. Without a
    /// `#heroAnimation` container the fallback text is still set and the
    /// button still works.
    pub fn start(this: &Rc<RefCell<Self>>) {
        Self::load(this, HERO_ASSET);

        let Some(button) = this.borrow().view.more_button.clone() else {
            return;
        };
        let hero = this.clone();
        let on_click = Closure::<dyn FnMut()>::new(move || hero.borrow().focus_animation());
        let _ = button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
        on_click.forget();
    }

    /// Swaps to the thinking asset while a reply is pending and back afterwards.
    pub fn set_thinking(this: &Rc<RefCell<Self>>, thinking: bool) {
        {
            let mut hero = this.borrow_mut();
            if hero.thinking == thinking
                || hero.player.is_none()
                || hero.view.animation.is_none()
            {
                return;
            }
            hero.thinking = thinking;
        }
        let asset = if thinking { THINKING_ASSET } else { HERO_ASSET };
        Self::load(this, asset);
    }

    fn load(this: &Rc<RefCell<Self>>, asset: &'static str) {
        let pending = {
            let mut hero = this.borrow_mut();
            let (Some(player), Some(container)) = (hero.player.clone(), hero.view.animation.clone())
            else {
                hero.tracker.unsupported();
                hero.render(UNSUPPORTED_TEXT);
                return;
            };

            let ticket = hero.tracker.begin(asset);
            // Destroy the previous instance before the new one renders into the same container.
            hero.current = None;
            let handle = LottieHandle::create(&player, &container, asset);
            let ready = handle.ready();
            hero.current = Some(handle);
            hero.render(LOAD_FAILED_TEXT);
            (ticket, ready)
        };

        let hero = this.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let (ticket, ready) = pending;
            let loaded = ready.await;
            let mut hero = hero.borrow_mut();
            if hero.tracker.finish(ticket, loaded) {
                match hero.tracker.playing_asset() {
                    Some(asset) => log::debug!("Hero animation playing '{asset}'"),
                    None => log::warn!("Hero animation '{}' failed to load", ticket.asset),
                }
                hero.render(LOAD_FAILED_TEXT);
            } else {
                log::debug!("Ignoring stale load of '{}'", ticket.asset);
            }
        });
    }

    /// Syncs the fallback element with the current phase.
    fn render(&self, failure_text: &str) {
        let Some(fallback) = &self.view.fallback else {
            return;
        };
        let classes = fallback.class_list();
        if !self.tracker.fallback_visible() {
            let _ = classes.add_1("hidden");
            return;
        }
        let text = match self.tracker.phase() {
            HeroPhase::Fallback => Some(failure_text),
            _ => self.placeholder.as_deref(),
        };
        fallback.set_text_content(text);
        let _ = classes.remove_1("hidden");
    }

    fn focus_animation(&self) {
        if let Some(content) = &self.view.content {
            let _ = content.class_list().add_1("hidden");
        }
        if let Some(container) = &self.view.container {
            let _ = container.class_list().add_1("only-animation");
        }
        if let Some(animation) = &self.view.animation {
            let _ = animation.class_list().add_1("only");
        }
        if let Some(current) = &self.current {
            current.play();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_moves_from_idle_to_playing() {
        let mut tracker = LoadTracker::default();
        assert_eq!(tracker.phase(), HeroPhase::Idle);

        let ticket = tracker.begin(HERO_ASSET);
        assert_eq!(tracker.phase(), HeroPhase::Loading);
        assert!(tracker.finish(ticket, true));
        assert_eq!(tracker.phase(), HeroPhase::Playing);
        assert_eq!(tracker.playing_asset(), Some(HERO_ASSET));
    }

    #[test]
    fn failed_load_falls_back() {
        let mut tracker = LoadTracker::default();
        let ticket = tracker.begin(HERO_ASSET);
        assert!(tracker.finish(ticket, false));
        assert_eq!(tracker.phase(), HeroPhase::Fallback);
        assert_eq!(tracker.playing_asset(), None);
    }

    #[test]
    fn stale_completion_cannot_clobber_newer_load() {
        let mut tracker = LoadTracker::default();
        let hero = tracker.begin(HERO_ASSET);
        let thinking = tracker.begin(THINKING_ASSET);

        assert!(tracker.finish(thinking, true));
        assert!(!tracker.finish(hero, false));
        assert_eq!(tracker.phase(), HeroPhase::Playing);
        assert_eq!(tracker.playing_asset(), Some(THINKING_ASSET));
    }

    #[test]
    fn stale_success_is_ignored_while_newer_load_pending() {
        let mut tracker = LoadTracker::default();
        let first = tracker.begin(THINKING_ASSET);
        let second = tracker.begin(HERO_ASSET);

        assert!(!tracker.finish(first, true));
        assert_eq!(tracker.phase(), HeroPhase::Loading);
        assert!(tracker.is_current(second));
    }

    #[test]
    fn fallback_stays_hidden_during_swaps_after_first_play() {
        let mut tracker = LoadTracker::default();
        let first = tracker.begin(HERO_ASSET);
        assert!(tracker.fallback_visible());
        assert!(tracker.finish(first, true));
        assert!(!tracker.fallback_visible());

        let swap = tracker.begin(THINKING_ASSET);
        assert_eq!(tracker.phase(), HeroPhase::Loading);
        assert!(!tracker.fallback_visible());

        assert!(tracker.finish(swap, false));
        assert!(tracker.fallback_visible());
    }

    #[test]
    fn fallback_shown_while_nothing_has_played() {
        let mut tracker = LoadTracker::default();
        assert!(tracker.fallback_visible());
        let failed = tracker.begin(HERO_ASSET);
        assert!(tracker.finish(failed, false));

        tracker.begin(THINKING_ASSET);
        assert!(tracker.fallback_visible());
    }

    #[test]
    fn unsupported_invalidates_pending_loads() {
        let mut tracker = LoadTracker::default();
        let ticket = tracker.begin(HERO_ASSET);
        tracker.unsupported();
        assert!(!tracker.finish(ticket, true));
        assert_eq!(tracker.phase(), HeroPhase::Fallback);
    }
}
