use crate::api::{HttpTransport, Side};
use crate::config::{timeout_ms, ViewerConfig};
use crate::hover::Ticket;
use crate::page::WebPage;
use crate::viewer::{NodeBox, NodeHighlight, PairAction, TreeView};
use leptos::logging::{error, log, warn};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

type WebTreeView = TreeView<WebPage, HttpTransport>;

const INSTANCE_KEY: &str = "__ete_webplugin";

// Marks tree images that already carry pointer handlers.
const BOUND_ATTR: &str = "data-ete-bound";

const GLOBALS: &[&str] = &[
    "update_server_status",
    "get_tree_diff",
    "get_tree_image",
    "get_server_diff",
    "show_actions",
    "run_action",
    "run_tree_action",
    "highlight_node",
    "unhighlight_node",
    "color_nodes",
    "bind_popup",
    "hide_popup",
    "hide_diff",
    "clear_all",
    "clear_elements",
];

/// JS-facing surface.
///
/// The tree server emits image maps whose handlers call page globals (`highlight_node(...)`,
/// `show_actions(...)`, `run_action(...)`, `bind_popup()`). [`EteWebPlugin::install`] defines
/// those globals as thin shims onto one plugin instance.
#[wasm_bindgen]
#[derive(Clone)]
pub struct EteWebPlugin {
    view: Rc<WebTreeView>,
    hover_timeout: Rc<Cell<Option<i32>>>,
}

#[wasm_bindgen]
impl EteWebPlugin {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<EteWebPlugin, JsValue> {
        Self::with_config(ViewerConfig::from_env())
    }

    /// Defines the page globals used by server-generated markup.
    pub fn install(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        js_sys::Reflect::set(&window, &INSTANCE_KEY.into(), &JsValue::from(self.clone()))?;

        for name in GLOBALS {
            let shim = js_sys::Function::new_with_args(
                "...args",
                &format!("return window.{INSTANCE_KEY}.{name}(...args);"),
            );
            js_sys::Reflect::set(&window, &(*name).into(), &shim)?;
        }

        log!("ete webplugin installed against {}", self.view.config().base_url);
        Ok(())
    }

    pub fn ready(&self) {
        let view = self.view.clone();
        spawn_local(async move { view.ready().await });
    }

    pub fn update_server_status(&self) {
        let view = self.view.clone();
        spawn_local(async move { view.update_server_status().await });
    }

    pub fn get_tree_diff(
        &self,
        newick1: String,
        recipient1: String,
        newick2: String,
        recipient2: String,
    ) {
        let view = self.view.clone();
        spawn_local(async move {
            view.get_tree_diff(&newick1, &recipient1, &newick2, &recipient2)
                .await
        });
    }

    pub fn get_tree_image(&self, newick: String, recipient: String) {
        let view = self.view.clone();
        spawn_local(async move { view.get_tree_image(&newick, &recipient).await });
    }

    pub fn get_server_diff(&self, newick1: String, newick2: String, recipient: String) {
        let view = self.view.clone();
        spawn_local(async move { view.get_server_diff(&newick1, &newick2, &recipient).await });
    }

    pub fn show_actions(&self, treeid: String, nodeid: String, faceid: String) {
        let view = self.view.clone();
        spawn_local(async move { view.show_actions(&treeid, &nodeid, &faceid).await });
    }

    pub fn run_action(
        &self,
        treeid1: String,
        treeid2: String,
        nodeid1: String,
        nodeid2: String,
        faceid: String,
        aindex: String,
    ) {
        let action = PairAction {
            treeid1,
            treeid2,
            nodeid1,
            nodeid2,
            faceid,
            aindex,
        };
        let view = self.view.clone();
        spawn_local(async move { view.run_action(&action).await });
    }

    pub fn run_tree_action(&self, treeid: String, nodeid: String, faceid: String, aindex: String) {
        let view = self.view.clone();
        spawn_local(async move {
            view.run_tree_action(&treeid, &nodeid, &faceid, &aindex)
                .await
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn highlight_node(
        &self,
        treeid1: String,
        treeid2: String,
        nodeid1: String,
        nodeid2: String,
        faceid: String,
        x1: f64,
        y1: f64,
        width1: f64,
        height1: f64,
        x2: f64,
        y2: f64,
        width2: f64,
        height2: f64,
        dist: f64,
    ) {
        let hl = NodeHighlight {
            treeid1,
            treeid2,
            nodeid1,
            nodeid2,
            faceid,
            box1: NodeBox {
                x: x1,
                y: y1,
                width: width1,
                height: height1,
            },
            box2: NodeBox {
                x: x2,
                y: y2,
                width: width2,
                height: height2,
            },
            dist,
        };
        let view = self.view.clone();
        spawn_local(async move { view.highlight_node(&hl).await });
    }

    pub fn unhighlight_node(&self) {
        self.view.unhighlight_node();
    }

    pub fn color_nodes(&self, treeid1: String, nodeid1: String, nodeid2: String, side: String) {
        let side = match side.parse::<Side>() {
            Ok(side) => side,
            Err(_) => {
                warn!("color_nodes: unknown side {side:?}, expected source or target");
                return;
            }
        };
        let view = self.view.clone();
        spawn_local(async move { view.color_nodes(&treeid1, &nodeid1, &nodeid2, side).await });
    }

    pub fn hide_popup(&self) {
        self.view.hide_popup();
    }

    pub fn hide_diff(&self) {
        self.view.hide_diff();
    }

    pub fn clear_all(&self) {
        self.cancel_hover_timeout();
        self.view.clear_all();
    }

    pub fn clear_elements(&self) {
        self.cancel_hover_timeout();
        self.view.clear_elements();
    }

    /// Attaches pointer handlers to every tree image not yet bound.
    pub fn bind_popup(&self) {
        let selector = self.view.config().tree_image_class.clone();
        for el in self.view.page().elements(&selector) {
            if el.has_attribute(BOUND_ATTR) {
                continue;
            }
            let _ = el.set_attribute(BOUND_ATTR, "1");
            self.attach_pointer_handlers(&el);
        }
        self.bind_popup_drag();
    }
}

impl EteWebPlugin {
    pub fn with_config(config: ViewerConfig) -> Result<EteWebPlugin, JsValue> {
        let page = WebPage::new().ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self {
            view: Rc::new(TreeView::new(config, page, HttpTransport::new())),
            hover_timeout: Rc::new(Cell::new(None)),
        })
    }

    pub(crate) fn overlays_present(&self) -> bool {
        !self
            .view
            .page()
            .elements(&self.view.config().overlays.popup)
            .is_empty()
    }

    fn cancel_hover_timeout(&self) {
        if let (Some(tid), Some(win)) = (self.hover_timeout.take(), web_sys::window()) {
            win.clear_timeout_with_handle(tid);
        }
    }

    fn schedule_hover_timeout(&self, ticket: Ticket) {
        self.cancel_hover_timeout();
        let Some(win) = web_sys::window() else {
            return;
        };

        let view = self.view.clone();
        let slot = self.hover_timeout.clone();
        let cb = Closure::once_into_js(move || {
            slot.set(None);
            view.on_hover_timeout(ticket);
        });

        match win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            timeout_ms(self.view.hover_delay_ms()),
        ) {
            Ok(tid) => self.hover_timeout.set(Some(tid)),
            Err(e) => warn!("cannot schedule hover timeout: {e:?}"),
        }
    }

    /// Makes both popups draggable, once per element.
    fn bind_popup_drag(&self) {
        let o = &self.view.config().overlays;
        for popup in [o.popup.clone(), o.popup2.clone()] {
            for el in self.view.page().elements(&popup) {
                if el.has_attribute(BOUND_ATTR) {
                    continue;
                }
                let _ = el.set_attribute(BOUND_ATTR, "1");
                self.attach_drag_handlers(&el, &popup);
            }
        }
    }

    fn attach_drag_handlers(&self, el: &web_sys::HtmlElement, popup: &str) {
        let listen = |event: &str, handler: Closure<dyn FnMut(web_sys::PointerEvent)>| {
            if el
                .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
                .is_err()
            {
                warn!("cannot listen for {event} on {popup}");
            }
            handler.forget();
        };

        let p = self.clone();
        let host = el.clone();
        let selector = popup.to_string();
        listen(
            "pointerdown",
            Closure::new(move |ev: web_sys::PointerEvent| {
                let tags = grabbed_tags(&ev, &host);
                let started = p.view.begin_popup_drag(
                    &selector,
                    ev.page_x() as f64,
                    ev.page_y() as f64,
                    tags.iter().map(String::as_str),
                );
                if started {
                    ev.prevent_default();
                    // Keeps the moves coming while the pointer outruns the popup.
                    let _ = host.set_pointer_capture(ev.pointer_id());
                }
            }),
        );

        let p = self.clone();
        listen(
            "pointermove",
            Closure::new(move |ev: web_sys::PointerEvent| {
                if p.view.drag_popup_to(ev.page_x() as f64, ev.page_y() as f64) {
                    ev.prevent_default();
                }
            }),
        );

        for event in ["pointerup", "pointercancel"] {
            let p = self.clone();
            let host = el.clone();
            listen(
                event,
                Closure::new(move |ev: web_sys::PointerEvent| {
                    if p.view.end_popup_drag() {
                        let _ = host.release_pointer_capture(ev.pointer_id());
                    }
                }),
            );
        }
    }

    fn attach_pointer_handlers(&self, el: &web_sys::HtmlElement) {
        let listen = |event: &str, handler: Closure<dyn FnMut(web_sys::MouseEvent)>| {
            if el
                .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
                .is_err()
            {
                warn!("cannot listen for {event} on tree image");
            }
            // Lives as long as the element.
            handler.forget();
        };

        let p = self.clone();
        listen(
            "mouseenter",
            Closure::new(move |_: web_sys::MouseEvent| {
                p.view.on_pointer_enter();
            }),
        );

        let p = self.clone();
        listen(
            "mousemove",
            Closure::new(move |ev: web_sys::MouseEvent| {
                let ticket = p.view.on_pointer_move(
                    ev.page_x() as f64,
                    ev.page_y() as f64,
                    js_sys::Date::now(),
                );
                p.schedule_hover_timeout(ticket);
            }),
        );

        let p = self.clone();
        listen(
            "mouseout",
            Closure::new(move |_: web_sys::MouseEvent| {
                p.cancel_hover_timeout();
                p.view.on_pointer_leave();
            }),
        );

        let p = self.clone();
        listen(
            "click",
            Closure::new(move |ev: web_sys::MouseEvent| {
                p.view.on_click(ev.page_x() as f64, ev.page_y() as f64);
            }),
        );
    }
}

/// Tag names from the pressed element up to, not including, the popup itself.
fn grabbed_tags(ev: &web_sys::PointerEvent, popup: &web_sys::HtmlElement) -> Vec<String> {
    let mut tags = vec![];
    let mut node = ev
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok());
    while let Some(el) = node {
        let el_node: &web_sys::Node = &el;
        if popup.is_same_node(Some(el_node)) {
            break;
        }
        tags.push(el.tag_name());
        node = el.parent_element();
    }
    tags
}

/// Creates the plugin, defines the page globals and, for bare pages, mounts the demo viewer.
pub(crate) fn start() {
    let plugin = match EteWebPlugin::new() {
        Ok(p) => p,
        Err(e) => {
            error!("ete webplugin unavailable: {e:?}");
            return;
        }
    };

    if let Err(e) = plugin.install() {
        error!("cannot install ete webplugin globals: {e:?}");
    }

    if !plugin.overlays_present() {
        crate::app::mount(plugin.clone());
    }
    plugin.bind_popup();

    plugin.ready();
}
