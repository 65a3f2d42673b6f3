//! Shared fixtures: an in-memory NotebookLM client and service builders.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use notebooklm_mcp_server::client::*;
use notebooklm_mcp_server::error::NotebookError;
use notebooklm_mcp_server::mcp::rpc::RpcRequest;
use notebooklm_mcp_server::mcp::tools::{ToolContext, ToolRegistry};
use notebooklm_mcp_server::mcp::McpService;
use notebooklm_mcp_server::poller::{Clock, JobPoller};

#[derive(Default)]
struct MockState {
    notebooks: Vec<Notebook>,
    sources: HashMap<String, Vec<Source>>,
    job_script: VecDeque<JobStatusReport>,
    stall_jobs: bool,
    auth_failure: bool,
    artifact_bytes: Vec<u8>,
    next_id: u32,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// In-memory stand-in for the remote service. Counts every remote call.
#[derive(Default)]
pub struct MockNotebookClient {
    state: Mutex<MockState>,
    calls: AtomicUsize,
}

impl MockNotebookClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Statuses returned by successive job polls; succeeds once exhausted.
    pub fn script_job(&self, statuses: Vec<JobStatusReport>) {
        self.state.lock().job_script = statuses.into();
    }

    /// Every job stays pending forever.
    pub fn stall_jobs(&self) {
        self.state.lock().stall_jobs = true;
    }

    pub fn fail_auth(&self) {
        self.state.lock().auth_failure = true;
    }

    pub fn set_artifact_bytes(&self, bytes: &[u8]) {
        self.state.lock().artifact_bytes = bytes.to_vec();
    }

    fn enter(&self) -> Result<(), NotebookError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.state.lock().auth_failure {
            return Err(NotebookError::AuthenticationRequired(
                "no session file at /tmp/missing.json".into(),
            ));
        }
        Ok(())
    }

    fn not_found(what: &str, id: &str) -> NotebookError {
        NotebookError::Rejected {
            status: 404,
            body: format!("{} {} not found", what, id),
        }
    }
}

#[async_trait]
impl NotebookClient for MockNotebookClient {
    async fn list_notebooks(&self) -> ClientResult<Vec<Notebook>> {
        self.enter()?;
        Ok(self.state.lock().notebooks.clone())
    }

    async fn create_notebook(&self, title: &str) -> ClientResult<Notebook> {
        self.enter()?;
        let mut state = self.state.lock();
        let notebook = Notebook {
            id: state.next_id("nb"),
            title: title.to_string(),
            created_at: None,
        };
        state.notebooks.push(notebook.clone());
        Ok(notebook)
    }

    async fn get_notebook(&self, notebook_id: &str) -> ClientResult<Notebook> {
        self.enter()?;
        self.state
            .lock()
            .notebooks
            .iter()
            .find(|nb| nb.id == notebook_id)
            .cloned()
            .ok_or_else(|| Self::not_found("notebook", notebook_id))
    }

    async fn notebook_summary(&self, _notebook_id: &str) -> ClientResult<Option<String>> {
        self.enter()?;
        Ok(Some("A notebook about testing.".to_string()))
    }

    async fn delete_notebook(&self, notebook_id: &str) -> ClientResult<bool> {
        self.enter()?;
        let mut state = self.state.lock();
        let before = state.notebooks.len();
        state.notebooks.retain(|nb| nb.id != notebook_id);
        Ok(state.notebooks.len() < before)
    }

    async fn rename_notebook(&self, notebook_id: &str, title: &str) -> ClientResult<Notebook> {
        self.enter()?;
        let mut state = self.state.lock();
        let notebook = state
            .notebooks
            .iter_mut()
            .find(|nb| nb.id == notebook_id)
            .ok_or_else(|| Self::not_found("notebook", notebook_id))?;
        notebook.title = title.to_string();
        Ok(notebook.clone())
    }

    async fn add_source(&self, notebook_id: &str, source: NewSource) -> ClientResult<Source> {
        self.enter()?;
        let mut state = self.state.lock();
        let (title, source_type) = match source {
            NewSource::Url { url } => (url, "url"),
            NewSource::Text { title, .. } => (title, "text"),
            NewSource::File { file_name, .. } => (file_name, "file"),
        };
        let source = Source {
            id: state.next_id("src"),
            title,
            source_type: source_type.to_string(),
            status: "ready".to_string(),
        };
        state
            .sources
            .entry(notebook_id.to_string())
            .or_default()
            .push(source.clone());
        Ok(source)
    }

    async fn list_sources(&self, notebook_id: &str) -> ClientResult<Vec<Source>> {
        self.enter()?;
        Ok(self
            .state
            .lock()
            .sources
            .get(notebook_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn source_fulltext(
        &self,
        _notebook_id: &str,
        source_id: &str,
    ) -> ClientResult<SourceFulltext> {
        self.enter()?;
        Ok(SourceFulltext {
            title: format!("Source {}", source_id),
            content: "Full text of the source.".to_string(),
        })
    }

    async fn source_guide(&self, _notebook_id: &str, source_id: &str) -> ClientResult<String> {
        self.enter()?;
        Ok(format!("Guide for {}", source_id))
    }

    async fn delete_source(&self, notebook_id: &str, source_id: &str) -> ClientResult<bool> {
        self.enter()?;
        let mut state = self.state.lock();
        let Some(sources) = state.sources.get_mut(notebook_id) else {
            return Ok(false);
        };
        let before = sources.len();
        sources.retain(|source| source.id != source_id);
        Ok(sources.len() < before)
    }

    async fn ask(
        &self,
        notebook_id: &str,
        question: &str,
        source_ids: Option<&[String]>,
    ) -> ClientResult<ChatAnswer> {
        self.enter()?;
        let state = self.state.lock();
        let references = state
            .sources
            .get(notebook_id)
            .into_iter()
            .flatten()
            .filter(|source| source_ids.map_or(true, |ids| ids.contains(&source.id)))
            .enumerate()
            .map(|(i, source)| Citation {
                citation_number: Some(i as u32 + 1),
                source_id: source.id.clone(),
                cited_text: Some(format!("excerpt from {}", source.title)),
            })
            .collect();
        Ok(ChatAnswer {
            answer: format!("Answer to: {}", question),
            references,
        })
    }

    async fn configure_chat(
        &self,
        _notebook_id: &str,
        _custom_prompt: Option<&str>,
    ) -> ClientResult<()> {
        self.enter()
    }

    async fn start_research(
        &self,
        _notebook_id: &str,
        query: &str,
        source: ResearchSource,
        mode: ResearchMode,
    ) -> ClientResult<Option<ResearchReport>> {
        self.enter()?;
        let mut report = ResearchReport::new();
        report.insert("task_id".into(), json!("research-1"));
        report.insert(
            "summary".into(),
            json!(format!("{} research on {} ({})", source.as_str(), query, mode.as_str())),
        );
        report.insert(
            "sources".into(),
            json!([{ "url": "https://example.com/finding", "title": "Finding" }]),
        );
        Ok(Some(report))
    }

    async fn poll_research(&self, _notebook_id: &str) -> ClientResult<Value> {
        self.enter()?;
        Ok(json!({ "status": "completed", "sources": [] }))
    }

    async fn import_research_sources(
        &self,
        notebook_id: &str,
        _task_id: &str,
        sources: &[DiscoveredSource],
    ) -> ClientResult<Vec<Source>> {
        self.enter()?;
        let mut state = self.state.lock();
        let mut imported = Vec::new();
        for found in sources {
            let source = Source {
                id: state.next_id("src"),
                title: found.title.clone(),
                source_type: "url".to_string(),
                status: "ready".to_string(),
            };
            state
                .sources
                .entry(notebook_id.to_string())
                .or_default()
                .push(source.clone());
            imported.push(source);
        }
        Ok(imported)
    }

    async fn start_generation(
        &self,
        notebook_id: &str,
        request: &GenerationRequest,
    ) -> ClientResult<JobHandle> {
        self.enter()?;
        let task_id = self.state.lock().next_id("task");
        Ok(JobHandle {
            notebook_id: notebook_id.to_string(),
            task_id,
            kind: request.kind(),
        })
    }

    async fn job_status(&self, handle: &JobHandle) -> ClientResult<JobStatusReport> {
        self.enter()?;
        let mut state = self.state.lock();
        if state.stall_jobs {
            return Ok(JobStatusReport::pending());
        }
        Ok(state.job_script.pop_front().unwrap_or_else(|| {
            JobStatusReport::succeeded(ArtifactRef {
                id: format!("artifact-{}", handle.task_id),
                kind: handle.kind,
                title: Some(format!("Generated {}", handle.kind)),
                content: None,
            })
        }))
    }

    async fn list_artifacts(
        &self,
        _notebook_id: &str,
        kind: Option<ArtifactKind>,
    ) -> ClientResult<Vec<ArtifactSummary>> {
        self.enter()?;
        Ok([ArtifactKind::Report, ArtifactKind::Audio]
            .into_iter()
            .filter(|k| kind.map_or(true, |wanted| wanted == *k))
            .map(|k| ArtifactSummary {
                id: format!("{}-1", k),
                kind: k,
                title: format!("My {}", k),
                status: Some(JobStatus::Succeeded),
            })
            .collect())
    }

    async fn download_artifact(
        &self,
        _notebook_id: &str,
        _kind: ArtifactKind,
        _format: DownloadFormat,
    ) -> ClientResult<Vec<u8>> {
        self.enter()?;
        Ok(self.state.lock().artifact_bytes.clone())
    }

    async fn refresh_auth(&self) -> ClientResult<()> {
        self.enter()
    }

    async fn close(&self) {}
}

/// Clock whose sleeps return at once and only advance virtual time.
pub struct SteppingClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl SteppingClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }
}

#[async_trait]
impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    async fn sleep(&self, duration: Duration) {
        *self.offset.lock() += duration;
        tokio::task::yield_now().await;
    }
}

pub fn registry(client: Arc<MockNotebookClient>, download_dir: &Path) -> ToolRegistry {
    let poller = JobPoller::new(Arc::new(SteppingClock::new()));
    let context = ToolContext::new(client, poller, download_dir.to_path_buf());
    ToolRegistry::new(context)
}

pub fn service(client: Arc<MockNotebookClient>, download_dir: &Path) -> McpService {
    McpService::new(registry(client, download_dir))
}

pub fn request(id: u64, method: &str, params: Value) -> RpcRequest {
    serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    }))
    .unwrap()
}
