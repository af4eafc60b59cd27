#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WebPage;

#[cfg(test)]
pub(crate) mod memory;

/// Document-relative position of an element's top-left corner, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
    pub top: f64,
    pub left: f64,
}

/// The page as the tree viewer sees it.
///
/// Selectors are plain CSS selectors (`#popup`, `#AbC12`, `.column`). Operations on a selector
/// that matches nothing are no-ops.
pub trait Page {
    /// Replaces the inner HTML of every match.
    fn set_html(&self, selector: &str, html: &str);

    fn show(&self, selector: &str);

    fn hide(&self, selector: &str);

    /// True when the first match is rendered (not `display: none`).
    fn is_visible(&self, selector: &str) -> bool;

    fn set_style(&self, selector: &str, property: &str, value: &str);

    fn offset(&self, selector: &str) -> Option<Offset>;

    fn set_opacity(&self, selector: &str, opacity: f64);

    /// Jumps to transparent, then fades to opaque over `duration_ms`.
    fn fade_in(&self, selector: &str, duration_ms: u32);
}

pub(crate) fn px(v: f64) -> String {
    format!("{v}px")
}

/// `#id` for a generated container id.
pub(crate) fn id_selector(id: &str) -> String {
    format!("#{id}")
}
