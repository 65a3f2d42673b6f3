//! reqwest-backed NotebookLM client.
//!
//! Requests go to a JSON bridge that fronts NotebookLM's private RPC
//! endpoints, authenticated with the cookies of the stored browser session.
//! The session is loaded on first use and dropped again whenever the remote
//! side rejects it, so a re-run of the login flow is picked up without a
//! restart.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::session::Session;
use super::types::*;
use super::{ClientResult, NotebookClient};
use crate::error::NotebookError;

/// Connection settings for [`HttpNotebookClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub storage_path: PathBuf,
    pub request_timeout: Duration,
}

pub struct HttpNotebookClient {
    http: reqwest::Client,
    base_url: Url,
    storage_path: PathBuf,
    session: RwLock<Option<Session>>,
}

impl HttpNotebookClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .timeout(config.request_timeout)
            .user_agent(concat!("notebooklm-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(config.api_url.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                NotebookError::TransportError(format!("invalid API URL '{}'", config.api_url))
            })?;

        Ok(Self {
            http,
            base_url,
            storage_path: config.storage_path,
            session: RwLock::new(None),
        })
    }

    /// Endpoint under the base URL. Each segment is percent-encoded on its
    /// own, so an id can never add path components, a query or a fragment.
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        if let Some(bad) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
            return Err(NotebookError::InvalidId(bad.to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NotebookError::TransportError("API URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn session(&self) -> ClientResult<Session> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(session.clone());
        }

        let mut slot = self.session.write().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }

        let loaded = Session::load(&self.storage_path).await?;
        log::info!(
            "NotebookLM session loaded from {} ({} cookies)",
            loaded.path().display(),
            loaded.cookie_count()
        );
        *slot = Some(loaded.clone());
        Ok(loaded)
    }

    async fn execute(&self, request: RequestBuilder) -> ClientResult<Response> {
        let session = self.session().await?;
        let response = request
            .header(COOKIE, session.cookie_header())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();
        let err = classify_failure(status, body, retry_after);

        if matches!(err, NotebookError::AuthenticationRequired(_)) {
            *self.session.write().await = None;
        }
        log::warn!("NotebookLM request failed: {}", err);
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| NotebookError::TransportError(format!("malformed response: {}", err)))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        self.fetch(self.http.get(self.url(segments)?)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        self.fetch(self.http.post(self.url(segments)?).json(body)).await
    }

    async fn delete(&self, segments: &[&str]) -> ClientResult<bool> {
        let reply: Deleted = self.fetch(self.http.delete(self.url(segments)?)).await?;
        Ok(reply.deleted)
    }
}

/// Map a non-2xx reply onto an error kind. Bodies stay opaque.
pub fn classify_failure(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> NotebookError {
    let body = body.trim().to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let detail = if body.is_empty() {
                format!("session rejected (HTTP {})", status.as_u16())
            } else {
                body
            };
            NotebookError::AuthenticationRequired(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => NotebookError::RateLimited { retry_after },
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            NotebookError::TransportError(format!("upstream unavailable (HTTP {})", status.as_u16()))
        }
        _ => NotebookError::Rejected {
            status: status.as_u16(),
            body,
        },
    }
}

#[derive(Deserialize)]
struct Deleted {
    deleted: bool,
}

#[derive(Deserialize)]
struct Summary {
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct Guide {
    guide: String,
}

#[derive(Deserialize)]
struct Started {
    task_id: String,
}

#[derive(Deserialize)]
struct Research {
    #[serde(default)]
    result: Option<ResearchReport>,
}

#[async_trait]
impl NotebookClient for HttpNotebookClient {
    async fn list_notebooks(&self) -> ClientResult<Vec<Notebook>> {
        self.get(&["notebooks"]).await
    }

    async fn create_notebook(&self, title: &str) -> ClientResult<Notebook> {
        self.post(&["notebooks"], &json!({ "title": title })).await
    }

    async fn get_notebook(&self, notebook_id: &str) -> ClientResult<Notebook> {
        self.get(&["notebooks", notebook_id]).await
    }

    async fn notebook_summary(&self, notebook_id: &str) -> ClientResult<Option<String>> {
        let reply: Summary = self.get(&["notebooks", notebook_id, "summary"]).await?;
        Ok(reply.summary.filter(|s| !s.trim().is_empty()))
    }

    async fn delete_notebook(&self, notebook_id: &str) -> ClientResult<bool> {
        self.delete(&["notebooks", notebook_id]).await
    }

    async fn rename_notebook(&self, notebook_id: &str, title: &str) -> ClientResult<Notebook> {
        let request = self
            .http
            .patch(self.url(&["notebooks", notebook_id])?)
            .json(&json!({ "title": title }));
        self.fetch(request).await
    }

    async fn add_source(&self, notebook_id: &str, source: NewSource) -> ClientResult<Source> {
        match source {
            NewSource::File { file_name, data } => {
                let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
                let part = reqwest::multipart::Part::bytes(data)
                    .file_name(file_name)
                    .mime_str(mime.essence_str())?;
                let form = reqwest::multipart::Form::new().part("file", part);
                let url = self.url(&["notebooks", notebook_id, "sources", "file"])?;
                self.fetch(self.http.post(url).multipart(form)).await
            }
            other => self.post(&["notebooks", notebook_id, "sources"], &other).await,
        }
    }

    async fn list_sources(&self, notebook_id: &str) -> ClientResult<Vec<Source>> {
        self.get(&["notebooks", notebook_id, "sources"]).await
    }

    async fn source_fulltext(
        &self,
        notebook_id: &str,
        source_id: &str,
    ) -> ClientResult<SourceFulltext> {
        self.get(&["notebooks", notebook_id, "sources", source_id, "fulltext"])
            .await
    }

    async fn source_guide(&self, notebook_id: &str, source_id: &str) -> ClientResult<String> {
        let reply: Guide = self
            .get(&["notebooks", notebook_id, "sources", source_id, "guide"])
            .await?;
        Ok(reply.guide)
    }

    async fn delete_source(&self, notebook_id: &str, source_id: &str) -> ClientResult<bool> {
        self.delete(&["notebooks", notebook_id, "sources", source_id])
            .await
    }

    async fn ask(
        &self,
        notebook_id: &str,
        question: &str,
        source_ids: Option<&[String]>,
    ) -> ClientResult<ChatAnswer> {
        self.post(
            &["notebooks", notebook_id, "chat"],
            &json!({ "question": question, "source_ids": source_ids }),
        )
        .await
    }

    async fn configure_chat(
        &self,
        notebook_id: &str,
        custom_prompt: Option<&str>,
    ) -> ClientResult<()> {
        let request = self
            .http
            .put(self.url(&["notebooks", notebook_id, "chat", "config"])?)
            .json(&json!({ "custom_prompt": custom_prompt }));
        self.execute(request).await?;
        Ok(())
    }

    async fn start_research(
        &self,
        notebook_id: &str,
        query: &str,
        source: ResearchSource,
        mode: ResearchMode,
    ) -> ClientResult<Option<ResearchReport>> {
        let reply: Research = self
            .post(
                &["notebooks", notebook_id, "research"],
                &json!({ "query": query, "source": source, "mode": mode }),
            )
            .await?;
        Ok(reply.result)
    }

    async fn poll_research(&self, notebook_id: &str) -> ClientResult<Value> {
        self.get(&["notebooks", notebook_id, "research"]).await
    }

    async fn import_research_sources(
        &self,
        notebook_id: &str,
        task_id: &str,
        sources: &[DiscoveredSource],
    ) -> ClientResult<Vec<Source>> {
        self.post(
            &["notebooks", notebook_id, "research", task_id, "import"],
            &json!({ "sources": sources }),
        )
        .await
    }

    async fn start_generation(
        &self,
        notebook_id: &str,
        request: &GenerationRequest,
    ) -> ClientResult<JobHandle> {
        let started: Started = self
            .post(&["notebooks", notebook_id, "artifacts"], request)
            .await?;
        Ok(JobHandle {
            notebook_id: notebook_id.to_string(),
            task_id: started.task_id,
            kind: request.kind(),
        })
    }

    async fn job_status(&self, handle: &JobHandle) -> ClientResult<JobStatusReport> {
        self.get(&[
            "notebooks",
            handle.notebook_id.as_str(),
            "artifacts",
            "tasks",
            handle.task_id.as_str(),
        ])
        .await
    }

    async fn list_artifacts(
        &self,
        notebook_id: &str,
        kind: Option<ArtifactKind>,
    ) -> ClientResult<Vec<ArtifactSummary>> {
        let mut request = self
            .http
            .get(self.url(&["notebooks", notebook_id, "artifacts"])?);
        if let Some(kind) = kind {
            request = request.query(&[("type", kind.as_str())]);
        }
        self.fetch(request).await
    }

    async fn download_artifact(
        &self,
        notebook_id: &str,
        kind: ArtifactKind,
        format: DownloadFormat,
    ) -> ClientResult<Vec<u8>> {
        let url = self.url(&["notebooks", notebook_id, "artifacts", kind.as_str(), "download"])?;
        let request = self.http.get(url).query(&[("format", format.as_str())]);
        let response = self.execute(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn refresh_auth(&self) -> ClientResult<()> {
        let reloaded = Session::load(&self.storage_path).await?;
        log::info!(
            "NotebookLM session reloaded ({} cookies)",
            reloaded.cookie_count()
        );
        *self.session.write().await = Some(reloaded);
        Ok(())
    }

    async fn close(&self) {
        if self.session.write().await.take().is_some() {
            log::info!("NotebookLM client closed");
        }
    }
}
