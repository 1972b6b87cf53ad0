//! Purpose: Provide an HTTP client for the graphstore JSON protocol.
//! Exports: `RemoteClient`.
//! Role: Transport client that mirrors local store operations remotely.
//! Invariants: Requests and response envelopes align with the `serve` routes.
//! Invariants: Remote decode failures keep the server's message verbatim.

use crate::core::decode::decode;
use crate::core::encode::encode;
use crate::core::error::{Error, ErrorKind};
use crate::core::graph::Graph;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    base_url: Url,
    token: Option<String>,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct IdEnvelope {
    id: String,
}

#[derive(Deserialize)]
struct ContainsEnvelope {
    contains: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteError,
}

#[derive(Deserialize)]
struct RemoteError {
    kind: String,
    message: Option<String>,
    id: Option<String>,
    hint: Option<String>,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(RemoteClientInner {
                base_url,
                token: None,
                agent,
            }),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = Some(token.into());
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.token = token;
        } else {
            self.inner = Arc::new(RemoteClientInner {
                base_url: self.inner.base_url.clone(),
                token,
                agent: self.inner.agent.clone(),
            });
        }
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn save_graph(&self, graph: &Graph) -> ApiResult<String> {
        let url = build_url(&self.inner.base_url, &["api", "graphs"])?;
        let envelope: IdEnvelope = self.request_json("POST", &url, Some(&encode(graph)))?;
        Ok(envelope.id)
    }

    pub fn graph(&self, id: &str) -> ApiResult<Graph> {
        let url = build_url(&self.inner.base_url, &["api", "graphs", id])?;
        let value: serde_json::Value = self
            .request_json("GET", &url, None)
            .map_err(|err| err.with_id(id))?;
        decode(&value, None).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message(format!("remote graph failed validation: {err}"))
                .with_id(id)
        })
    }

    pub fn has_vertex(&self, id: &str, name: &str) -> ApiResult<bool> {
        let mut url = build_url(&self.inner.base_url, &["api", "graphs", id, "vertexes"])?;
        url.query_pairs_mut().append_pair("name", name);
        let envelope: ContainsEnvelope = self
            .request_json("GET", &url, None)
            .map_err(|err| err.with_id(id))?;
        Ok(envelope.contains)
    }

    fn request_json<R>(
        &self,
        method: &str,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        let mut request = self
            .inner
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json");
        if let Some(token) = &self.inner.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let response = match body {
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
            None => request.call(),
        };

        match response {
            Ok(resp) => read_json_response(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid remote base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("remote base url must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("remote base url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("remote base url cannot be a base")
        })?;
        path.clear();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        return error_from_remote(envelope.error);
    }
    let kind = error_kind_from_status(status);
    Error::new(kind).with_message(format!("remote error status {status}"))
}

fn error_from_remote(remote: RemoteError) -> Error {
    let mut err = Error::new(parse_error_kind(&remote.kind));
    if let Some(message) = remote.message {
        err = err.with_message(message);
    }
    if let Some(id) = remote.id {
        err = err.with_id(id);
    }
    if let Some(hint) = remote.hint {
        err = err.with_hint(hint);
    }
    err
}

fn parse_error_kind(kind: &str) -> ErrorKind {
    match kind {
        "Internal" => ErrorKind::Internal,
        "Usage" => ErrorKind::Usage,
        "NotFound" => ErrorKind::NotFound,
        "Permission" => ErrorKind::Permission,
        "Corrupt" => ErrorKind::Corrupt,
        "Io" => ErrorKind::Io,
        _ => ErrorKind::Internal,
    }
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Io,
    }
}
