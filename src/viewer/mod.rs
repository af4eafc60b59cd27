mod drag;
mod overlay;
mod pointer;

pub use overlay::{NodeBox, NodeHighlight, PairAction};

use crate::api::{
    ApiErrorKind, DrawTreeRequest, Endpoint, LoadTreesRequest, StatusRequest, Transport,
    TreeDiffRequest, TreeImageRequest,
};
use crate::config::ViewerConfig;
use crate::dispatch::{Dispatcher, LoadOutcome};
use crate::hover::HoverTimer;
use crate::ids::SessionRegistry;
use crate::page::{id_selector, Page};
use leptos::logging::error;
use std::cell::RefCell;

/// Tree view controller: ties the page, the tree server and the generated session ids together.
pub struct TreeView<P, T> {
    config: ViewerConfig,
    page: P,
    dispatcher: Dispatcher<T>,
    sessions: RefCell<SessionRegistry>,
    hover: RefCell<HoverTimer>,
    drag: RefCell<Option<drag::PopupDrag>>,
}

impl<P: Page, T: Transport> TreeView<P, T> {
    pub fn new(config: ViewerConfig, page: P, transport: T) -> Self {
        let dispatcher = Dispatcher::new(config.base_url.clone(), transport);
        let hover = HoverTimer::new(config.hover_delay_ms);
        Self {
            config,
            page,
            dispatcher,
            sessions: RefCell::new(SessionRegistry::default()),
            hover: RefCell::new(hover),
            drag: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    /// Page-ready hook: both popups hidden, status refreshed.
    pub async fn ready(&self) {
        self.hide_popup();
        self.hide_diff();
        self.update_server_status().await;
    }

    pub async fn update_server_status(&self) {
        let target = self.config.overlays.server_status.clone();
        self.dispatcher
            .load(&self.page, &target, Endpoint::Status, &StatusRequest::default())
            .await;
    }

    /// Replaces `recipient` with fresh placeholder containers, one per requested session id.
    ///
    /// Every id is registered under `recipient`; only the first names a container.
    fn open_sessions(&self, recipient: &str, count: usize) -> Option<Vec<String>> {
        let mut sessions = self.sessions.borrow_mut();
        sessions.retire_recipient(recipient);

        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            match sessions.issue(recipient) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    error!("cannot open tree session for {recipient}: {e}");
                    return None;
                }
            }
        }
        drop(sessions);

        if let Some(first) = ids.first() {
            self.page
                .set_html(recipient, &self.config.container_html(first));
        }
        Some(ids)
    }

    async fn load_and_fade<Q: serde::Serialize + ?Sized>(
        &self,
        treeid: &str,
        endpoint: Endpoint,
        params: &Q,
    ) -> LoadOutcome {
        let target = id_selector(treeid);
        let outcome = self
            .dispatcher
            .load(&self.page, &target, endpoint, params)
            .await;
        if outcome.is_applied() {
            self.page.fade_in(&target, self.config.fade_in_ms);
        }
        outcome
    }

    /// Loads two trees on the server and draws each into its own recipient.
    pub async fn get_tree_diff(
        &self,
        newick1: &str,
        recipient1: &str,
        newick2: &str,
        recipient2: &str,
    ) {
        self.clear_all();

        let Some(treeid1) = self.open_sessions(recipient1, 1).and_then(|v| v.into_iter().next())
        else {
            return;
        };
        let Some(treeid2) = self.open_sessions(recipient2, 1).and_then(|v| v.into_iter().next())
        else {
            return;
        };

        let req = LoadTreesRequest {
            newick1: newick1.to_string(),
            treeid1: treeid1.clone(),
            newick2: newick2.to_string(),
            treeid2: treeid2.clone(),
        };
        if let Err(e) = self.dispatcher.fire(Endpoint::LoadTrees, &req).await {
            // Without loaded trees every draw would fail; leave placeholders or show the error.
            if e.kind != ApiErrorKind::Network {
                for treeid in [&treeid1, &treeid2] {
                    self.page.set_html(&id_selector(treeid), &e.to_fragment());
                }
            }
            return;
        }

        let draw1 = DrawTreeRequest {
            treeid: treeid1.clone(),
        };
        let draw2 = DrawTreeRequest {
            treeid: treeid2.clone(),
        };
        futures::join!(
            self.load_and_fade(&treeid1, Endpoint::DrawTree, &draw1),
            self.load_and_fade(&treeid2, Endpoint::DrawTree, &draw2),
        );
    }

    /// Renders a single tree straight from its newick text.
    pub async fn get_tree_image(&self, newick: &str, recipient: &str) {
        let Some(treeid) = self.open_sessions(recipient, 1).and_then(|v| v.into_iter().next())
        else {
            return;
        };

        let req = TreeImageRequest {
            newick: newick.to_string(),
            treeid: treeid.clone(),
        };
        self.load_and_fade(&treeid, Endpoint::TreeImage, &req).await;
    }

    /// Lets the server compute and render a diff of two trees into one recipient.
    pub async fn get_server_diff(&self, newick1: &str, newick2: &str, recipient: &str) {
        let Some(ids) = self.open_sessions(recipient, 2) else {
            return;
        };
        let [treeid, treeid2] = [ids[0].clone(), ids[1].clone()];

        let req = TreeDiffRequest {
            newick: newick1.to_string(),
            treeid: treeid.clone(),
            newick2: newick2.to_string(),
            treeid2,
        };
        self.load_and_fade(&treeid, Endpoint::TreeDiff, &req).await;
    }

    /// Recipient a live session id was created under.
    pub fn session_recipient(&self, treeid: &str) -> Option<String> {
        self.sessions.borrow().recipient(treeid).map(|s| s.to_string())
    }

    /// Hides overlays and highlights and empties every tree column.
    pub fn clear_all(&self) {
        self.clear_elements();
        self.page.set_html(&self.config.column_class, "");
        self.sessions.borrow_mut().clear();
    }

    /// Hides overlays and highlights; tree images stay.
    pub fn clear_elements(&self) {
        self.hide_popup();
        self.hide_diff();
        self.unhighlight_node();
        self.hover.borrow_mut().cancel();
        self.end_popup_drag();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::ApiError;
    use crate::ids::is_session_id;
    use crate::page::memory::MemoryPage;
    use futures::executor::block_on;
    use futures::FutureExt;

    pub(crate) fn viewer() -> TreeView<MemoryPage, MockTransport> {
        let page = MemoryPage::with_overlays();
        page.add("left", &["column"]);
        page.add("right", &["column"]);
        TreeView::new(ViewerConfig::default(), page, MockTransport::default())
    }

    fn container_id(view: &TreeView<MemoryPage, MockTransport>, recipient: &str) -> String {
        let html = view.page().html(recipient).unwrap_or_default();
        html.split('"').nth(1).unwrap_or_default().to_string()
    }

    #[test]
    fn test_ready_hides_popups_and_loads_status() {
        let view = viewer();
        view.transport().respond("/status", Ok("alive".to_string()));

        block_on(view.ready());

        assert!(!view.page().is_visible("#popup"));
        assert!(!view.page().is_visible("#popup2"));
        assert_eq!(view.page().html("server_status").as_deref(), Some("alive"));
    }

    #[test]
    fn test_get_tree_diff_end_to_end() {
        let view = viewer();
        view.transport()
            .respond("/draw_tree", Ok("<img class=\"ete_tree_img\">".to_string()));
        let release = view.transport().hold("/load_trees");

        let mut fut = Box::pin(view.get_tree_diff("(A,B);", "#left", "(A,C);", "#right"));
        assert!(fut.as_mut().now_or_never().is_none());

        // Placeholders are in place before the server answers.
        let id1 = container_id(&view, "left");
        let id2 = container_id(&view, "right");
        assert!(is_session_id(&id1) && is_session_id(&id2));
        assert_ne!(id1, id2);
        let loading = view.config().loading_html.clone();
        assert_eq!(view.page().html(&id1), Some(loading.clone()));
        assert_eq!(view.page().html(&id2), Some(loading));
        assert!(view.transport().calls_to("/draw_tree").is_empty());

        let _ = release.send(());
        block_on(fut);

        let load = view.transport().calls_to("/load_trees");
        assert_eq!(load.len(), 1);
        assert_eq!(load[0].form["newick1"], "(A,B);");
        assert_eq!(load[0].form["treeid1"], id1.as_str());
        assert_eq!(load[0].form["newick2"], "(A,C);");
        assert_eq!(load[0].form["treeid2"], id2.as_str());

        let draws = view.transport().calls_to("/draw_tree");
        assert_eq!(draws.len(), 2);
        let drawn: Vec<_> = draws.iter().map(|c| c.form["treeid"].clone()).collect();
        assert!(drawn.contains(&id1.as_str().into()) && drawn.contains(&id2.as_str().into()));

        for id in [&id1, &id2] {
            let el = view.page().get(id).expect("container exists");
            assert_eq!(el.html, "<img class=\"ete_tree_img\">");
            assert_eq!(el.fades, vec![1000]);
        }
        assert_eq!(view.session_recipient(&id1).as_deref(), Some("#left"));
        assert_eq!(view.session_recipient(&id2).as_deref(), Some("#right"));
    }

    #[test]
    fn test_draw_tree_fills_named_container() {
        let view = viewer();
        view.page().add("AbC12", &[]);
        view.transport().respond("/draw_tree", Ok("<p>tree</p>".to_string()));

        let outcome = block_on(view.load_and_fade(
            "AbC12",
            Endpoint::DrawTree,
            &DrawTreeRequest {
                treeid: "AbC12".to_string(),
            },
        ));

        assert!(outcome.is_applied());
        assert_eq!(view.page().html("AbC12").as_deref(), Some("<p>tree</p>"));
    }

    #[test]
    fn test_get_tree_diff_load_failure_skips_draws() {
        let view = viewer();
        view.transport().respond(
            "/load_trees",
            Err(ApiError::http(500, "boom".to_string(), "/load_trees")),
        );

        block_on(view.get_tree_diff("(A,B);", "#left", "(A,C);", "#right"));

        assert!(view.transport().calls_to("/draw_tree").is_empty());
        let id1 = container_id(&view, "left");
        assert!(view.page().html(&id1).unwrap_or_default().contains("ete_error"));
    }

    #[test]
    fn test_get_tree_diff_network_failure_keeps_placeholders() {
        let view = viewer();
        view.transport()
            .respond("/load_trees", Err(ApiError::network("refused")));

        block_on(view.get_tree_diff("(A,B);", "#left", "(A,C);", "#right"));

        let id2 = container_id(&view, "right");
        assert_eq!(view.page().html(&id2), Some(view.config().loading_html.clone()));
    }

    #[test]
    fn test_get_tree_image_posts_newick_and_id() {
        let view = viewer();
        view.transport()
            .respond("/get_tree_image", Ok("<img>".to_string()));

        block_on(view.get_tree_image("((A,B),C);", "#left"));

        let id = container_id(&view, "left");
        let calls = view.transport().calls_to("/get_tree_image");
        assert_eq!(calls[0].form["newick"], "((A,B),C);");
        assert_eq!(calls[0].form["treeid"], id.as_str());
        assert_eq!(view.page().html(&id).as_deref(), Some("<img>"));
    }

    #[test]
    fn test_reloading_recipient_retires_previous_session() {
        let view = viewer();
        block_on(view.get_tree_image("(A,B);", "#left"));
        let first = container_id(&view, "left");
        block_on(view.get_tree_image("(A,C);", "#left"));
        let second = container_id(&view, "left");

        assert_ne!(first, second);
        assert!(view.session_recipient(&first).is_none());
        assert_eq!(view.session_recipient(&second).as_deref(), Some("#left"));
        assert!(!view.page().exists(&first));
    }

    #[test]
    fn test_get_server_diff_sends_both_trees() {
        let view = viewer();
        view.transport()
            .respond("/get_tree_diff", Ok("<img id='diff'>".to_string()));

        block_on(view.get_server_diff("(A,B);", "(A,C);", "#left"));

        let id = container_id(&view, "left");
        let calls = view.transport().calls_to("/get_tree_diff");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].form["newick"], "(A,B);");
        assert_eq!(calls[0].form["treeid"], id.as_str());
        assert_eq!(calls[0].form["newick2"], "(A,C);");
        let treeid2 = calls[0].form["treeid2"].as_str().unwrap_or_default();
        assert!(is_session_id(treeid2));
        assert_ne!(treeid2, id);
        assert_eq!(view.page().html(&id).as_deref(), Some("<img id='diff'>"));
    }

    #[test]
    fn test_clear_all_hides_overlays_and_empties_columns() {
        let view = viewer();
        block_on(view.get_tree_image("(A,B);", "#left"));
        view.page().show("#popup");
        view.page().show("#popup2");

        view.clear_all();

        for id in ["#popup", "#popup2", "#highlighter1", "#highlighter2"] {
            assert!(!view.page().is_visible(id), "{id} should be hidden");
        }
        assert_eq!(view.page().html("left").as_deref(), Some(""));
        assert_eq!(view.page().html("right").as_deref(), Some(""));
    }

    #[test]
    fn test_clear_elements_keeps_trees() {
        let view = viewer();
        view.transport().respond("/get_tree_image", Ok("<img>".to_string()));
        block_on(view.get_tree_image("(A,B);", "#left"));
        let id = container_id(&view, "left");

        view.clear_elements();

        assert!(!view.page().is_visible("#highlighter1"));
        assert_eq!(view.page().html(&id).as_deref(), Some("<img>"));
    }
}
