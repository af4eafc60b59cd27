pub mod api;
pub mod config;
pub mod dispatch;
pub mod hover;
pub mod ids;
pub mod page;
pub mod viewer;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod bindings;

#[cfg(target_arch = "wasm32")]
pub use bindings::EteWebPlugin;

pub use api::{ApiError, ApiErrorKind, Endpoint, HttpTransport, Side, Transport};
pub use config::ViewerConfig;
pub use page::{Offset, Page};
pub use viewer::{NodeBox, NodeHighlight, PairAction, TreeView};

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();

    #[cfg(target_arch = "wasm32")]
    bindings::start();
}
