use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Network,
    Http { status: u16 },
    Body,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn network(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn body(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Body,
            message: e.to_string(),
        }
    }

    pub(crate) fn http(status: u16, body: String, path: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http { status },
            message: format!("{path} ({status}): {body}"),
        }
    }

    /// Markup shown in a target whose request came back with an error status.
    pub(crate) fn to_fragment(&self) -> String {
        format!(
            r#"<div class="ete_error">{}</div>"#,
            v_htmlescape::escape(&self.message)
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Paths served by the tree rendering server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr, strum::Display)]
pub enum Endpoint {
    #[strum(serialize = "/status")]
    Status,
    #[strum(serialize = "/load_trees")]
    LoadTrees,
    #[strum(serialize = "/draw_tree")]
    DrawTree,
    #[strum(serialize = "/get_tree_diff")]
    TreeDiff,
    #[strum(serialize = "/get_tree_image")]
    TreeImage,
    #[strum(serialize = "/get_actions")]
    Actions,
    #[strum(serialize = "/run_action")]
    RunAction,
    #[strum(serialize = "/get_dist")]
    Dist,
    #[strum(serialize = "/color_nodes")]
    ColorNodes,
}

impl Endpoint {
    pub fn path(&self) -> &str {
        self.as_ref()
    }
}

/// Which tree of a compared pair a request addresses.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::AsRefStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StatusRequest {}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoadTreesRequest {
    pub newick1: String,
    pub treeid1: String,
    pub newick2: String,
    pub treeid2: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DrawTreeRequest {
    pub treeid: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TreeDiffRequest {
    pub newick: String,
    pub treeid: String,
    pub newick2: String,
    pub treeid2: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TreeImageRequest {
    pub newick: String,
    pub treeid: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ActionsRequest {
    pub treeid: String,
    pub nodeid: String,
    pub faceid: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RunActionRequest {
    pub treeid: String,
    pub nodeid: String,
    pub faceid: String,
    pub aindex: String,

    /// Omitted for single-tree pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DistRequest {
    pub treeid: String,
    pub nodeid: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ColorNodesRequest {
    pub treeid1: String,
    pub nodeid1: String,
    pub nodeid2: String,
    pub side: Side,
}

/// One form-encoded POST, answered with the response body as text.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn post_form<Q: Serialize + ?Sized>(&self, url: &str, form: &Q) -> ApiResult<String>;
}

#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for HttpTransport {
    async fn post_form<Q: Serialize + ?Sized>(&self, url: &str, form: &Q) -> ApiResult<String> {
        let res = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(ApiError::network)?;

        let status = res.status();
        if status.is_success() {
            res.text().await.map_err(ApiError::body)
        } else {
            let body = res.text().await.unwrap_or_default();
            let path = res_path(url);
            Err(ApiError::http(status.as_u16(), body, &path))
        }
    }
}

fn res_path(url: &str) -> String {
    url.split_once("://")
        .and_then(|(_, rest)| rest.find('/').map(|i| rest[i..].to_string()))
        .unwrap_or_else(|| url.to_string())
}
