use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::BackendError;
use super::model::{AnalysisResult, GraphLink, GraphSnapshot, NodeId, NodePayload};

/// Remote analysis and graph persistence service.
///
/// Calls block; the UI runs them on worker threads.
pub trait GraphBackend: Send + Sync {
    fn fetch_full_graph(&self) -> Result<GraphSnapshot, BackendError>;
    fn analyze(&self, text: &str) -> Result<AnalysisResult, BackendError>;
    fn update_node(&self, id: &str, fields: &NodePayload) -> Result<NodePayload, BackendError>;
    fn delete_node(&self, id: &str) -> Result<(), BackendError>;
    fn delete_nodes(&self, ids: &[NodeId]) -> Result<(), BackendError>;
    fn create_link(&self, link: &GraphLink) -> Result<GraphLink, BackendError>;
}

/// A change that is followed by a full graph reload.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    UpdateNode { id: NodeId, fields: NodePayload },
    DeleteNode(NodeId),
    DeleteNodes(Vec<NodeId>),
    CreateLink(GraphLink),
}

impl Mutation {
    pub fn describe(&self) -> String {
        match self {
            Self::UpdateNode { id, .. } => format!("update node {id}"),
            Self::DeleteNode(id) => format!("delete node {id}"),
            Self::DeleteNodes(ids) => format!("delete {} nodes", ids.len()),
            Self::CreateLink(link) => format!(
                "link {} -[{}]-> {}",
                link.source, link.relation, link.target
            ),
        }
    }

    pub fn is_batch_delete(&self) -> bool {
        matches!(self, Self::DeleteNodes(_))
    }

    /// Ids that stop existing once the mutation lands.
    pub fn removed_ids(&self) -> &[NodeId] {
        match self {
            Self::DeleteNode(id) => std::slice::from_ref(id),
            Self::DeleteNodes(ids) => ids,
            _ => &[],
        }
    }
}

/// Outcome of a mutation that reached the backend. The reload may still
/// have failed.
#[derive(Debug)]
pub struct MutationReport {
    pub mutation: Mutation,
    pub reload: Result<GraphSnapshot, BackendError>,
}

/// Applies `mutation`, then fetches the full graph. A failed mutation is
/// returned as `Err`; a failed reload is carried inside the report.
pub fn mutate_and_reload(
    backend: &dyn GraphBackend,
    mutation: Mutation,
) -> Result<MutationReport, BackendError> {
    match &mutation {
        Mutation::UpdateNode { id, fields } => {
            backend.update_node(id, fields)?;
        }
        Mutation::DeleteNode(id) => backend.delete_node(id)?,
        Mutation::DeleteNodes(ids) => backend.delete_nodes(ids)?,
        Mutation::CreateLink(link) => {
            backend.create_link(link)?;
        }
    }
    info!("{} applied, reloading graph", mutation.describe());

    let reload = backend.fetch_full_graph();
    if let Err(error) = &reload {
        warn!("reload after {} failed: {error}", mutation.describe());
    }
    Ok(MutationReport { mutation, reload })
}

#[derive(Serialize)]
struct BatchDeleteBody<'a> {
    node_ids: &'a [NodeId],
}

/// JSON-over-HTTP client for the analysis service.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::Client)?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self {
            client,
            base_url,
            token: token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, BackendError> {
        debug!("-> {endpoint}");
        let response = self
            .authorized(request)
            .send()
            .map_err(|source| BackendError::Transport {
                endpoint: endpoint.to_owned(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(BackendError::Status {
            endpoint: endpoint.to_owned(),
            status: status.as_u16(),
            detail: error_detail(&body),
        })
    }

    fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, BackendError> {
        response.json().map_err(|source| BackendError::Decode {
            endpoint: endpoint.to_owned(),
            source,
        })
    }
}

impl GraphBackend for HttpBackend {
    fn fetch_full_graph(&self) -> Result<GraphSnapshot, BackendError> {
        let endpoint = "GET /graph/all";
        let response = self.send(endpoint, self.client.get(self.url("/graph/all")))?;
        Self::decode(endpoint, response)
    }

    fn analyze(&self, text: &str) -> Result<AnalysisResult, BackendError> {
        let endpoint = "POST /analyze/note";
        let request = self
            .client
            .post(self.url("/analyze/note"))
            .query(&[("content", text)]);
        Self::decode(endpoint, self.send(endpoint, request)?)
    }

    fn update_node(&self, id: &str, fields: &NodePayload) -> Result<NodePayload, BackendError> {
        let endpoint = format!("PATCH /graph/nodes/{id}");
        let request = self
            .client
            .patch(self.url(&format!("/graph/nodes/{id}")))
            .json(fields);
        Self::decode(&endpoint, self.send(&endpoint, request)?)
    }

    fn delete_node(&self, id: &str) -> Result<(), BackendError> {
        let endpoint = format!("DELETE /graph/nodes/{id}");
        let request = self.client.delete(self.url(&format!("/graph/nodes/{id}")));
        self.send(&endpoint, request).map(drop)
    }

    fn delete_nodes(&self, ids: &[NodeId]) -> Result<(), BackendError> {
        let endpoint = "POST /graph/nodes/batch-delete";
        let request = self
            .client
            .post(self.url("/graph/nodes/batch-delete"))
            .json(&BatchDeleteBody { node_ids: ids });
        self.send(endpoint, request).map(drop)
    }

    fn create_link(&self, link: &GraphLink) -> Result<GraphLink, BackendError> {
        let endpoint = "POST /graph/links";
        let request = self.client.post(self.url("/graph/links")).json(link);
        Self::decode(endpoint, self.send(endpoint, request)?)
    }
}

/// Pulls a readable message out of an error body; services usually answer
/// with `{"detail": "..."}`.
fn error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value.get("detail") {
            Some(serde_json::Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        });

    match detail {
        Some(detail) => detail,
        None if body.trim().is_empty() => "no details".to_owned(),
        None => body.trim().chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_prefers_json_field() {
        assert_eq!(error_detail(r#"{"detail": "Node not found"}"#), "Node not found");
        assert_eq!(error_detail(""), "no details");
        assert_eq!(error_detail("Internal Server Error"), "Internal Server Error");
    }

    #[test]
    fn base_url_loses_trailing_slash_and_blank_token() {
        let backend = HttpBackend::new("http://localhost:8000/", Some("  ".into()), Duration::from_secs(1))
            .expect("client builds");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/graph/all"), "http://localhost:8000/graph/all");
        assert!(backend.token.is_none());
    }

    #[test]
    fn removed_ids_cover_single_and_batch_deletes() {
        assert_eq!(Mutation::DeleteNode("a".into()).removed_ids(), ["a".to_owned()]);
        assert_eq!(
            Mutation::DeleteNodes(vec!["a".into(), "b".into()]).removed_ids().len(),
            2
        );
        assert!(Mutation::CreateLink(GraphLink::new("a", "b", "rel")).removed_ids().is_empty());
    }
}
