//! NotebookLM client seam.
//!
//! Every tool reaches the remote service through [`NotebookClient`]. The
//! server holds a single shared handle; tests substitute their own
//! implementation.

pub mod http;
pub mod session;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NotebookError;

pub use http::{ClientConfig, HttpNotebookClient};
pub use session::Session;
pub use types::*;

/// Shared client handle passed to every tool call site.
pub type SharedClient = Arc<dyn NotebookClient + Send + Sync>;

pub type ClientResult<T> = Result<T, NotebookError>;

#[async_trait]
pub trait NotebookClient {
    // Notebooks
    async fn list_notebooks(&self) -> ClientResult<Vec<Notebook>>;
    async fn create_notebook(&self, title: &str) -> ClientResult<Notebook>;
    async fn get_notebook(&self, notebook_id: &str) -> ClientResult<Notebook>;
    async fn notebook_summary(&self, notebook_id: &str) -> ClientResult<Option<String>>;
    async fn delete_notebook(&self, notebook_id: &str) -> ClientResult<bool>;
    async fn rename_notebook(&self, notebook_id: &str, title: &str) -> ClientResult<Notebook>;

    // Sources
    /// Adds a source and waits until the remote service has processed it.
    async fn add_source(&self, notebook_id: &str, source: NewSource) -> ClientResult<Source>;
    async fn list_sources(&self, notebook_id: &str) -> ClientResult<Vec<Source>>;
    async fn source_fulltext(
        &self,
        notebook_id: &str,
        source_id: &str,
    ) -> ClientResult<SourceFulltext>;
    async fn source_guide(&self, notebook_id: &str, source_id: &str) -> ClientResult<String>;
    async fn delete_source(&self, notebook_id: &str, source_id: &str) -> ClientResult<bool>;

    // Chat
    async fn ask(
        &self,
        notebook_id: &str,
        question: &str,
        source_ids: Option<&[String]>,
    ) -> ClientResult<ChatAnswer>;
    async fn configure_chat(
        &self,
        notebook_id: &str,
        custom_prompt: Option<&str>,
    ) -> ClientResult<()>;

    // Research
    async fn start_research(
        &self,
        notebook_id: &str,
        query: &str,
        source: ResearchSource,
        mode: ResearchMode,
    ) -> ClientResult<Option<ResearchReport>>;
    async fn poll_research(&self, notebook_id: &str) -> ClientResult<Value>;
    async fn import_research_sources(
        &self,
        notebook_id: &str,
        task_id: &str,
        sources: &[DiscoveredSource],
    ) -> ClientResult<Vec<Source>>;

    // Artifacts
    async fn start_generation(
        &self,
        notebook_id: &str,
        request: &GenerationRequest,
    ) -> ClientResult<JobHandle>;
    async fn job_status(&self, handle: &JobHandle) -> ClientResult<JobStatusReport>;
    async fn list_artifacts(
        &self,
        notebook_id: &str,
        kind: Option<ArtifactKind>,
    ) -> ClientResult<Vec<ArtifactSummary>>;
    async fn download_artifact(
        &self,
        notebook_id: &str,
        kind: ArtifactKind,
        format: DownloadFormat,
    ) -> ClientResult<Vec<u8>>;

    // Session
    async fn refresh_auth(&self) -> ClientResult<()>;
    async fn close(&self);
}
