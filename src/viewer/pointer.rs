use super::TreeView;
use crate::api::Transport;
use crate::hover::Ticket;
use crate::page::{px, Page};

// Offsets from the pointer, in px.
const HOVER_POPUP_DX: f64 = 15.0;
const ACTION_POPUP_INSET: f64 = 2.0;

impl<P: Page, T: Transport> TreeView<P, T> {
    /// The hover popup only makes sense over a highlighted node while no action menu is open.
    fn hover_popup_allowed(&self) -> bool {
        let o = &self.config.overlays;
        !self.page.is_visible(&o.popup) && self.page.is_visible(&o.highlighter1)
    }

    fn show_hover_popup(&self) -> bool {
        if !self.hover_popup_allowed() {
            return false;
        }
        self.page.show(&self.config.overlays.popup2);
        true
    }

    pub fn on_pointer_enter(&self) -> bool {
        self.show_hover_popup()
    }

    /// Moves the hover popup next to the pointer and restarts the mouse-stop timer.
    ///
    /// The host must call [`TreeView::on_hover_timeout`] with the returned ticket after
    /// [`TreeView::hover_delay_ms`].
    pub fn on_pointer_move(&self, page_x: f64, page_y: f64, now_ms: f64) -> Ticket {
        let popup2 = &self.config.overlays.popup2;
        self.page.set_style(popup2, "left", &px(page_x + HOVER_POPUP_DX));
        self.page.set_style(popup2, "top", &px(page_y));
        self.page.set_style(popup2, "position", "absolute");
        self.page.set_style(popup2, "background-color", "#fff");
        self.page.hide(popup2);

        self.hover.borrow_mut().restart(now_ms)
    }

    /// Mouse-stop callback. True if the hover popup was shown.
    pub fn on_hover_timeout(&self, ticket: Ticket) -> bool {
        if !self.hover.borrow_mut().fire(ticket) {
            return false;
        }
        self.show_hover_popup()
    }

    /// Virtual-clock counterpart of the host timer, for hosts that poll.
    pub fn poll_hover(&self, now_ms: f64) -> bool {
        let due = self.hover.borrow_mut().poll(now_ms);
        due.is_some() && self.show_hover_popup()
    }

    pub fn on_pointer_leave(&self) {
        self.hover.borrow_mut().cancel();
        self.hide_diff();
    }

    /// Opens the action popup at the click point.
    pub fn on_click(&self, page_x: f64, page_y: f64) {
        let popup = &self.config.overlays.popup;
        self.page.set_style(popup, "left", &px(page_x - ACTION_POPUP_INSET));
        self.page.set_style(popup, "top", &px(page_y - ACTION_POPUP_INSET));
        self.page.set_style(popup, "position", "absolute");
        self.page.set_style(popup, "background-color", "#fff");
        self.page.show(popup);
        self.hide_diff();
    }

    pub fn hover_delay_ms(&self) -> u32 {
        self.hover.borrow().delay_ms()
    }
}
