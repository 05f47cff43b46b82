use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, ScrollBehavior, ScrollToOptions, Window};

const SCROLL_OFFSET: f64 = 20.0;
const REVEAL_MARGIN: f64 = 50.0;
const SECTION_OFFSET: f64 = 100.0;
const CARD_SELECTOR: &str = ".risk-item, .tip-item, .activity-category, .team-member";

/// `.animate-on-scroll` elements reveal once their top edge is this far inside the viewport.
pub fn should_reveal(element_top: f64, window_height: f64) -> bool {
    element_top < window_height - REVEAL_MARGIN
}

/// A section is highlighted while the scroll position is inside it, with
/// the top pulled up by `SECTION_OFFSET` to account for the fixed header.
pub fn section_is_active(scroll_y: f64, offset_top: f64, height: f64) -> bool {
    let top = offset_top - SECTION_OFFSET;
    scroll_y > top && scroll_y <= top + height
}

/// `href="#about"` → `Some("about")`.
pub fn anchor_target(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

struct NavSection {
    section: HtmlElement,
    links: Vec<Element>,
}

/// Landing page elements, looked up once at startup.
pub struct LandingView {
    window: Window,
    document: Document,
    reveal: Vec<Element>,
    sections: Vec<NavSection>,
}

fn query_all(root: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl LandingView {
    pub fn bind(window: Window, document: Document) -> Self {
        let reveal = query_all(&document, ".animate-on-scroll");
        let sections = query_all(&document, "section[id]")
            .into_iter()
            .filter_map(|el| el.dyn_into::<HtmlElement>().ok())
            .map(|section| {
                let id = section.id();
                let links = [".mobile-nav", ".main-nav"]
                    .iter()
                    .filter_map(|nav| {
                        document
                            .query_selector(&format!("{nav} a[href*=\"{id}\"]"))
                            .ok()
                            .flatten()
                    })
                    .collect();
                NavSection { section, links }
            })
            .collect();

        Self { window, document, reveal, sections }
    }

    /// Attaches every landing behaviour and runs the scroll handlers once.
    pub fn install(self) {
        self.install_anchor_scrolling();
        self.install_card_hover();

        self.on_scroll();
        let view = self;
        let window = view.window.clone();
        let handler = Closure::<dyn FnMut()>::new(move || view.on_scroll());
        let _ = window.add_event_listener_with_callback("scroll", handler.as_ref().unchecked_ref());
        handler.forget();
    }

    fn on_scroll(&self) {
        self.reveal_visible();
        self.highlight_navigation();
    }

    fn reveal_visible(&self) {
        let window_height = self
            .window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0);
        for el in &self.reveal {
            if should_reveal(el.get_bounding_client_rect().top(), window_height) {
                let _ = el.class_list().add_1("animated");
            }
        }
    }

    fn highlight_navigation(&self) {
        let scroll_y = self.window.page_y_offset().unwrap_or(0.0);
        for nav in &self.sections {
            let active = section_is_active(
                scroll_y,
                nav.section.offset_top() as f64,
                nav.section.offset_height() as f64,
            );
            for link in &nav.links {
                let classes = link.class_list();
                let _ = if active { classes.add_1("active") } else { classes.remove_1("active") };
            }
        }
    }

    fn install_anchor_scrolling(&self) {
        for link in query_all(&self.document, "a[href^=\"#\"]") {
            let window = self.window.clone();
            let document = self.document.clone();
            let anchor = link.clone();
            let on_click = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
                ev.prevent_default();
                let href = anchor.get_attribute("href").unwrap_or_default();
                let Some(target) = anchor_target(&href)
                    .and_then(|id| document.get_element_by_id(id))
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                else {
                    return;
                };
                let opts = ScrollToOptions::new();
                opts.set_top(target.offset_top() as f64 - SCROLL_OFFSET);
                opts.set_behavior(ScrollBehavior::Smooth);
                window.scroll_to_with_scroll_to_options(&opts);
            });
            let _ = link.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
            on_click.forget();
        }
    }

    fn install_card_hover(&self) {
        for card in query_all(&self.document, CARD_SELECTOR) {
            let Ok(card) = card.dyn_into::<HtmlElement>() else {
                continue;
            };
            for (event, transform, shadow) in [
                ("mouseenter", "translateY(-5px)", "0 8px 16px rgba(0, 0, 0, 0.15)"),
                ("mouseleave", "translateY(0)", "0 4px 8px rgba(0, 0, 0, 0.1)"),
            ] {
                let style = card.style();
                let handler = Closure::<dyn FnMut()>::new(move || {
                    let _ = style.set_property("transform", transform);
                    let _ = style.set_property("box-shadow", shadow);
                });
                let _ = card.add_event_listener_with_callback(event, handler.as_ref().unchecked_ref());
                handler.forget();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_needs_margin_inside_viewport() {
        assert!(should_reveal(100.0, 800.0));
        assert!(should_reveal(749.0, 800.0));
        assert!(!should_reveal(750.0, 800.0));
        assert!(!should_reveal(1200.0, 800.0));
    }

    #[test]
    fn section_window_is_half_open() {
        // Section at 500px, 300px tall → active for scroll in (400, 700].
        assert!(!section_is_active(400.0, 500.0, 300.0));
        assert!(section_is_active(401.0, 500.0, 300.0));
        assert!(section_is_active(700.0, 500.0, 300.0));
        assert!(!section_is_active(701.0, 500.0, 300.0));
    }

    #[test]
    fn anchor_target_strips_hash() {
        assert_eq!(anchor_target("#about"), Some("about"));
        assert_eq!(anchor_target("#"), None);
        assert_eq!(anchor_target("/elsewhere"), None);
    }
}
