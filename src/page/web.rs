use super::{Offset, Page};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

/// `Page` backed by the live document.
#[derive(Clone)]
pub struct WebPage {
    document: Document,
}

impl WebPage {
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }

    pub(crate) fn elements(&self, selector: &str) -> Vec<HtmlElement> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            leptos::logging::warn!("invalid selector {selector}");
            return vec![];
        };

        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|n| n.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    fn first(&self, selector: &str) -> Option<HtmlElement> {
        self.document
            .query_selector(selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }
}

impl Page for WebPage {
    fn set_html(&self, selector: &str, html: &str) {
        for el in self.elements(selector) {
            el.set_inner_html(html);
        }
    }

    fn show(&self, selector: &str) {
        for el in self.elements(selector) {
            let _ = el.style().set_property("display", "block");
        }
    }

    fn hide(&self, selector: &str) {
        for el in self.elements(selector) {
            let _ = el.style().set_property("display", "none");
        }
    }

    fn is_visible(&self, selector: &str) -> bool {
        let Some(el) = self.first(selector) else {
            return false;
        };
        let Some(window) = web_sys::window() else {
            return false;
        };

        match window.get_computed_style(&el) {
            Ok(Some(style)) => style
                .get_property_value("display")
                .map(|d| d != "none")
                .unwrap_or(true),
            _ => true,
        }
    }

    fn set_style(&self, selector: &str, property: &str, value: &str) {
        for el in self.elements(selector) {
            let _ = el.style().set_property(property, value);
        }
    }

    fn offset(&self, selector: &str) -> Option<Offset> {
        let el = self.first(selector)?;
        let window = web_sys::window()?;
        let rect = el.get_bounding_client_rect();

        Some(Offset {
            top: rect.top() + window.scroll_y().unwrap_or(0.0),
            left: rect.left() + window.scroll_x().unwrap_or(0.0),
        })
    }

    fn set_opacity(&self, selector: &str, opacity: f64) {
        for el in self.elements(selector) {
            let style = el.style();
            let _ = style.remove_property("transition");
            let _ = style.set_property("opacity", &opacity.to_string());
        }
    }

    fn fade_in(&self, selector: &str, duration_ms: u32) {
        let targets = self.elements(selector);
        for el in &targets {
            let style = el.style();
            let _ = style.remove_property("transition");
            let _ = style.set_property("opacity", "0");
        }

        let Some(window) = web_sys::window() else {
            return;
        };

        // Next task, so the browser commits opacity 0 before the transition starts.
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            for el in targets {
                let style = el.style();
                let _ = style.set_property("transition", &format!("opacity {}ms", duration_ms));
                let _ = style.set_property("opacity", "1");
            }
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            0,
        );
    }
}
