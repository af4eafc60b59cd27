use super::TreeView;
use crate::api::{
    ActionsRequest, ColorNodesRequest, DistRequest, Endpoint, RunActionRequest, Side, Transport,
};
use crate::page::{id_selector, px, Page};
use leptos::logging::{log, warn};

/// Node bounding box in image pixels, as reported by the server's image map.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A hovered node and its matched node in the other tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeHighlight {
    pub treeid1: String,
    pub treeid2: String,
    pub nodeid1: String,
    pub nodeid2: String,
    pub faceid: String,
    pub box1: NodeBox,
    pub box2: NodeBox,
    pub dist: f64,
}

/// An action picked from the popup, applied to a source/target tree pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairAction {
    pub treeid1: String,
    pub treeid2: String,
    pub nodeid1: String,
    pub nodeid2: String,
    pub faceid: String,
    pub aindex: String,
}

impl<P: Page, T: Transport> TreeView<P, T> {
    pub fn hide_popup(&self) {
        self.page.hide(&self.config.overlays.popup);
    }

    pub fn hide_diff(&self) {
        self.page.hide(&self.config.overlays.popup2);
    }

    pub fn unhighlight_node(&self) {
        let o = &self.config.overlays;
        self.page.hide(&o.highlighter1);
        self.page.hide(&o.highlighter2);
    }

    /// Loads the action menu for a node into the action popup.
    pub async fn show_actions(&self, treeid: &str, nodeid: &str, faceid: &str) {
        let popup = self.config.overlays.popup.clone();
        self.page.set_html(&popup, &self.config.loading_html);

        let req = ActionsRequest {
            treeid: treeid.to_string(),
            nodeid: nodeid.to_string(),
            faceid: faceid.to_string(),
        };
        self.dispatcher
            .load(&self.page, &popup, Endpoint::Actions, &req)
            .await;
    }

    /// Runs an action on both trees of a pair, then refreshes server status.
    pub async fn run_action(&self, action: &PairAction) {
        log!(
            "run_action {} {} {} {} aindex={}",
            action.treeid1,
            action.treeid2,
            action.nodeid1,
            action.nodeid2,
            action.aindex
        );

        let status = self.config.overlays.server_status.clone();
        self.page.set_html(&status, &self.config.loading_html);
        self.clear_elements();

        // The server maps nodeid1 onto the target tree itself when side=target.
        let side_req = |treeid: &str, side: Side| RunActionRequest {
            treeid: treeid.to_string(),
            nodeid: action.nodeid1.clone(),
            faceid: action.faceid.clone(),
            aindex: action.aindex.clone(),
            side: Some(side),
        };
        let source = side_req(&action.treeid1, Side::Source);
        let target = side_req(&action.treeid2, Side::Target);

        futures::join!(
            self.run_into(&action.treeid1, &source),
            self.run_into(&action.treeid2, &target),
        );

        self.update_server_status().await;
    }

    /// Runs an action on a tree that has no compared partner.
    pub async fn run_tree_action(&self, treeid: &str, nodeid: &str, faceid: &str, aindex: &str) {
        self.clear_elements();

        let req = RunActionRequest {
            treeid: treeid.to_string(),
            nodeid: nodeid.to_string(),
            faceid: faceid.to_string(),
            aindex: aindex.to_string(),
            side: None,
        };
        self.run_into(treeid, &req).await;
    }

    async fn run_into(&self, treeid: &str, req: &RunActionRequest) {
        let target = id_selector(treeid);
        self.page.set_html(&target, &self.config.loading_html);

        let outcome = self
            .dispatcher
            .load(&self.page, &target, Endpoint::RunAction, req)
            .await;
        if outcome.is_applied() {
            self.page.set_opacity(&target, 1.0);
        }
    }

    /// Boxes the hovered node and its match, and fetches their distance into the hover popup.
    pub async fn highlight_node(&self, hl: &NodeHighlight) {
        log!(
            "highlight_node {}:{} ~ {}:{} face={} dist={}",
            hl.treeid1,
            hl.nodeid1,
            hl.treeid2,
            hl.nodeid2,
            hl.faceid,
            hl.dist
        );

        let o = &self.config.overlays;
        self.place_highlighter(&o.highlighter1, &hl.treeid1, hl.box1);
        self.place_highlighter(&o.highlighter2, &hl.treeid2, hl.box2);
        self.hide_popup();

        let popup2 = o.popup2.clone();
        let req = DistRequest {
            treeid: hl.treeid1.clone(),
            nodeid: hl.nodeid1.clone(),
        };
        self.dispatcher
            .load(&self.page, &popup2, Endpoint::Dist, &req)
            .await;
    }

    fn place_highlighter(&self, highlighter: &str, treeid: &str, b: NodeBox) {
        let Some(offset) = self.page.offset(&id_selector(treeid)) else {
            warn!("no tree container #{treeid} to highlight in");
            return;
        };

        // One pixel out on each side.
        let page = &self.page;
        page.show(highlighter);
        page.set_style(highlighter, "visibility", "visible");
        page.set_style(highlighter, "top", &px(offset.top + b.y - 1.0));
        page.set_style(highlighter, "left", &px(offset.left + b.x - 1.0));
        page.set_style(highlighter, "width", &px(b.width + 1.0));
        page.set_style(highlighter, "height", &px(b.height + 1.0));
    }

    /// Asks the server to recolor the matched nodes; the result replaces tree 1.
    pub async fn color_nodes(&self, treeid1: &str, nodeid1: &str, nodeid2: &str, side: Side) {
        let target = id_selector(treeid1);
        let req = ColorNodesRequest {
            treeid1: treeid1.to_string(),
            nodeid1: nodeid1.to_string(),
            nodeid2: nodeid2.to_string(),
            side,
        };

        let outcome = self
            .dispatcher
            .load(&self.page, &target, Endpoint::ColorNodes, &req)
            .await;
        if outcome.is_applied() {
            self.page.set_opacity(&target, 1.0);
        }
    }
}
