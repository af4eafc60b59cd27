use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8989";
pub(crate) const DEFAULT_LOADING_HTML: &str = r#"<img border=0 src="loader.gif">"#;

/// Fixed overlay elements the controller drives.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OverlayIds {
    pub popup: String,
    pub popup2: String,
    pub highlighter1: String,
    pub highlighter2: String,
    pub server_status: String,
}

impl Default for OverlayIds {
    fn default() -> Self {
        Self {
            popup: "#popup".to_string(),
            popup2: "#popup2".to_string(),
            highlighter1: "#highlighter1".to_string(),
            highlighter2: "#highlighter2".to_string(),
            server_status: "#server_status".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub base_url: String,
    pub loading_html: String,

    /// Pause after the last pointer move before the hover popup shows.
    pub hover_delay_ms: u32,
    pub fade_in_ms: u32,

    pub overlays: OverlayIds,
    pub tree_image_class: String,
    pub column_class: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            loading_html: DEFAULT_LOADING_HTML.to_string(),
            hover_delay_ms: 1000,
            fade_in_ms: 1000,
            overlays: OverlayIds::default(),
            tree_image_class: ".ete_tree_img".to_string(),
            column_class: ".column".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Placeholder markup for a freshly created tree container.
    pub fn container_html(&self, treeid: &str) -> String {
        format!(r#"<div id="{}">{}</div>"#, treeid, self.loading_html)
    }

    /// Reads overrides from `window.ENV`.
    ///
    /// Both `ETE_URL` (documented) and `ete_url` are accepted for the base URL.
    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        let Some(env) = web_sys::window().and_then(|w| w.get("ENV")) else {
            return cfg;
        };
        if env.is_undefined() || !env.is_object() {
            return cfg;
        }

        let get = |key: &str| js_sys::Reflect::get(&env, &key.into()).ok();

        for key in ["ETE_URL", "ete_url"] {
            if let Some(url) = get(key).and_then(|v| v.as_string()) {
                cfg.base_url = normalize_base_url(&url);
                break;
            }
        }

        if let Some(html) = get("LOADING_HTML").and_then(|v| v.as_string()) {
            cfg.loading_html = html;
        }
        if let Some(ms) = get("HOVER_DELAY_MS").and_then(|v| v.as_f64()).and_then(ms_from_f64) {
            cfg.hover_delay_ms = ms;
        }
        if let Some(ms) = get("FADE_IN_MS").and_then(|v| v.as_f64()).and_then(ms_from_f64) {
            cfg.fade_in_ms = ms;
        }

        cfg
    }
}

pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Delay argument for `setTimeout`, which takes a signed 32-bit count.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn timeout_ms(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn ms_from_f64(v: f64) -> Option<u32> {
    if v.is_finite() && v >= 0.0 && v <= i32::MAX as f64 {
        Some(v.round() as u32)
    } else {
        None
    }
}
