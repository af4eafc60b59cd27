use super::TreeView;
use crate::api::Transport;
use crate::page::{px, Page};

// Pressing on a menu entry (or inside one) clicks it instead of dragging the popup.
const DRAG_CANCEL_TAGS: &[&str] = &["span", "li"];

/// A popup being moved by the pointer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PopupDrag {
    popup: String,
    grab_dx: f64,
    grab_dy: f64,
}

impl<P: Page, T: Transport> TreeView<P, T> {
    /// Starts dragging `popup` from the pointer position.
    ///
    /// `grabbed_tags` names the pressed element and its ancestors inside the popup. No drag starts
    /// when any of them is a menu entry, or when the popup is not on the page.
    pub fn begin_popup_drag<'a>(
        &self,
        popup: &str,
        page_x: f64,
        page_y: f64,
        grabbed_tags: impl IntoIterator<Item = &'a str>,
    ) -> bool {
        let on_entry = grabbed_tags
            .into_iter()
            .any(|tag| DRAG_CANCEL_TAGS.iter().any(|c| c.eq_ignore_ascii_case(tag)));
        if on_entry {
            return false;
        }
        let Some(offset) = self.page.offset(popup) else {
            return false;
        };

        *self.drag.borrow_mut() = Some(PopupDrag {
            popup: popup.to_string(),
            grab_dx: page_x - offset.left,
            grab_dy: page_y - offset.top,
        });
        true
    }

    /// Moves the dragged popup so the grab point stays under the pointer. False when idle.
    pub fn drag_popup_to(&self, page_x: f64, page_y: f64) -> bool {
        let drag = self.drag.borrow();
        let Some(d) = drag.as_ref() else {
            return false;
        };

        self.page.set_style(&d.popup, "position", "absolute");
        self.page.set_style(&d.popup, "left", &px(page_x - d.grab_dx));
        self.page.set_style(&d.popup, "top", &px(page_y - d.grab_dy));
        true
    }

    pub fn end_popup_drag(&self) -> bool {
        self.drag.borrow_mut().take().is_some()
    }
}
