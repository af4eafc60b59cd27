use crate::api::{ApiError, ApiErrorKind, Endpoint, Transport};
use crate::page::Page;
use leptos::logging::{error, log, warn};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Response body now fills the target.
    Applied,
    /// A newer request for the same target was issued meanwhile; the body was dropped.
    Stale,
    Failed(ApiError),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }
}

/// Sends requests to the tree server and injects responses into page targets.
///
/// Each in-flight target selector remembers the generation of its latest request: only the
/// response to that request may write into it. The entry goes away once that response lands.
pub struct Dispatcher<T> {
    base_url: String,
    transport: T,
    next_generation: Cell<u64>,
    generations: RefCell<HashMap<String, u64>>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(base_url: String, transport: T) -> Self {
        Self {
            base_url,
            transport,
            next_generation: Cell::new(1),
            generations: RefCell::new(HashMap::new()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn begin(&self, target: &str) -> u64 {
        let generation = self.next_generation.get();
        self.next_generation.set(generation.wrapping_add(1));
        self.generations
            .borrow_mut()
            .insert(target.to_string(), generation);
        generation
    }

    /// True (and the target forgotten) if `generation` is the target's latest request.
    fn settle(&self, target: &str, generation: u64) -> bool {
        let mut generations = self.generations.borrow_mut();
        if generations.get(target) == Some(&generation) {
            generations.remove(target);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight_targets(&self) -> usize {
        self.generations.borrow().len()
    }

    /// Requests `endpoint` and loads the body into `target`.
    pub async fn load<P: Page, Q: Serialize + ?Sized>(
        &self,
        page: &P,
        target: &str,
        endpoint: Endpoint,
        params: &Q,
    ) -> LoadOutcome {
        let generation = self.begin(target);
        let url = format!("{}{}", self.base_url, endpoint.path());
        log!("{} -> {target}", endpoint.path());

        let result = self.transport.post_form(&url, params).await;

        // Ignore stale responses.
        if !self.settle(target, generation) {
            warn!("dropping superseded {} response for {target}", endpoint.path());
            return LoadOutcome::Stale;
        }

        match result {
            Ok(body) => {
                page.set_html(target, &body);
                LoadOutcome::Applied
            }
            Err(e) => {
                match e.kind {
                    ApiErrorKind::Network => {
                        warn!("{} for {target} did not complete: {e}", endpoint.path());
                    }
                    ApiErrorKind::Http { .. } | ApiErrorKind::Body => {
                        error!("{} for {target} failed: {e}", endpoint.path());
                        page.set_html(target, &e.to_fragment());
                    }
                }
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Requests `endpoint` for its server-side effect only.
    pub async fn fire<Q: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        params: &Q,
    ) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        log!("{} (fire)", endpoint.path());

        self.transport
            .post_form(&url, params)
            .await
            .map(|_| ())
            .inspect_err(|e| warn!("{} failed: {e}", endpoint.path()))
    }
}
