use crate::bindings::EteWebPlugin;
use leptos::prelude::*;

const LEFT: &str = "#tree_left";
const RIGHT: &str = "#tree_right";

const SAMPLE_NEWICK1: &str = "((A,B),(C,D));";
const SAMPLE_NEWICK2: &str = "((A,C),(B,D));";

#[derive(Clone, Copy)]
pub(crate) struct PluginContext(pub StoredValue<EteWebPlugin, LocalStorage>);

pub(crate) fn mount(plugin: EteWebPlugin) {
    leptos::mount::mount_to_body(move || view! { <App plugin=plugin /> });
}

#[component]
pub fn App(plugin: EteWebPlugin) -> impl IntoView {
    provide_context(PluginContext(StoredValue::new_local(plugin)));

    view! {
        <div class="ete-viewer">
            <div class="ete-header">
                <span>"Server: "</span>
                <span id="server_status"></span>
            </div>

            <TreePairForm />

            <div class="ete-columns" style="display:flex;gap:16px;">
                <div id="tree_left" class="column"></div>
                <div id="tree_right" class="column"></div>
            </div>

            <Overlays />
        </div>
    }
}

#[component]
fn TreePairForm() -> impl IntoView {
    let newick1: RwSignal<String> = RwSignal::new(SAMPLE_NEWICK1.to_string());
    let newick2: RwSignal<String> = RwSignal::new(SAMPLE_NEWICK2.to_string());

    let plugin = expect_context::<PluginContext>().0;

    let on_compare = move |_: web_sys::MouseEvent| {
        let n1 = newick1.get_untracked();
        let n2 = newick2.get_untracked();
        if n1.trim().is_empty() || n2.trim().is_empty() {
            return;
        }
        plugin.with_value(|p| {
            p.get_tree_diff(n1, LEFT.to_string(), n2, RIGHT.to_string());
        });
    };

    view! {
        <div class="ete-form" style="display:flex;gap:8px;align-items:flex-start;">
            <textarea
                rows="4"
                cols="40"
                prop:value=move || newick1.get()
                on:input=move |ev| newick1.set(event_target_value(&ev))
            ></textarea>
            <textarea
                rows="4"
                cols="40"
                prop:value=move || newick2.get()
                on:input=move |ev| newick2.set(event_target_value(&ev))
            ></textarea>
            <button type="button" on:click=on_compare>"Compare"</button>
        </div>
    }
}

/// Popups and highlight boxes, all hidden until the viewer needs them.
#[component]
fn Overlays() -> impl IntoView {
    const BOX: &str = "display:none;position:absolute;border:2px solid #d33;pointer-events:none;";

    view! {
        <div id="popup" style="display:none;"></div>
        <div id="popup2" style="display:none;"></div>
        <div id="highlighter1" style=BOX></div>
        <div id="highlighter2" style=BOX></div>
    }
}
