//! Tool workflows against the in-memory client.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::{registry, MockNotebookClient};
use notebooklm_mcp_server::client::{ArtifactKind, ArtifactRef, JobStatusReport};
use notebooklm_mcp_server::mcp::tools::ToolRegistry;

fn setup() -> (Arc<MockNotebookClient>, ToolRegistry, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(MockNotebookClient::new());
    let registry = registry(client.clone(), dir.path());
    (client, registry, dir)
}

async fn ok_text(registry: &ToolRegistry, tool: &str, arguments: Value) -> String {
    let result = registry.call_tool(tool, Some(arguments)).await;
    assert!(!result.is_error, "{} failed: {}", tool, result.text());
    result.text()
}

/// Value of an indented `label: value` line.
fn field(text: &str, label: &str) -> String {
    let prefix = format!("  {}: ", label);
    text.lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .unwrap_or_else(|| panic!("no {} in {}", label, text))
        .to_string()
}

#[tokio::test]
async fn test_create_add_and_ask_with_citation() {
    let (_client, registry, _dir) = setup();

    let created = ok_text(&registry, "notebook_create", json!({ "title": "Rust" })).await;
    assert!(created.starts_with("Notebook created successfully."));
    let notebook_id = field(&created, "ID");

    let added = ok_text(
        &registry,
        "source_add_url",
        json!({ "notebook_id": notebook_id, "url": "https://x" }),
    )
    .await;
    let source_id = field(&added, "ID");

    let answer = ok_text(
        &registry,
        "chat_ask",
        json!({ "notebook_id": notebook_id, "question": "What is it about?" }),
    )
    .await;
    assert!(answer.contains("Answer to: What is it about?"));
    assert!(answer.contains("References:"));
    assert!(answer.contains(&format!("[1] source {}", source_id)));
}

#[tokio::test]
async fn test_notebook_lifecycle() {
    let (_client, registry, _dir) = setup();
    let created = ok_text(&registry, "notebook_create", json!({ "title": "Draft" })).await;
    let notebook_id = field(&created, "ID");

    let renamed = ok_text(
        &registry,
        "notebook_rename",
        json!({ "notebook_id": notebook_id, "new_title": "Final" }),
    )
    .await;
    assert!(renamed.contains("Final"));

    let listed = ok_text(&registry, "notebook_list", json!({})).await;
    assert!(listed.starts_with("Found 1 notebook(s):"));

    let deleted = ok_text(&registry, "notebook_delete", json!({ "notebook_id": notebook_id })).await;
    assert!(deleted.contains("deleted successfully"));

    let again = registry
        .call_tool("notebook_delete", Some(json!({ "notebook_id": notebook_id })))
        .await;
    assert!(again.is_error);
}

#[tokio::test]
async fn test_generation_waits_for_the_job() {
    let (client, registry, _dir) = setup();
    client.script_job(vec![
        JobStatusReport::pending(),
        JobStatusReport::running(),
        JobStatusReport::running(),
    ]);

    let text = ok_text(
        &registry,
        "generate_report",
        json!({ "notebook_id": "nb-1", "poll_interval_seconds": 2 }),
    )
    .await;
    assert!(text.starts_with("Report generated successfully."));
    assert_eq!(field(&text, "Status"), "succeeded");
    assert_eq!(field(&text, "Format"), "briefing_doc");
    // start + three unfinished polls + the successful one
    assert_eq!(client.remote_calls(), 5);
}

#[tokio::test]
async fn test_generation_timeout_override() {
    let (client, registry, _dir) = setup();
    client.stall_jobs();

    let result = registry
        .call_tool(
            "generate_audio",
            Some(json!({
                "notebook_id": "nb-1",
                "timeout_seconds": 30,
                "poll_interval_seconds": 10
            })),
        )
        .await;
    assert!(result.is_error);
    let text = result.text();
    assert!(text.starts_with("[PollTimeout]"), "{}", text);
    assert!(text.contains("within 30s"));
    assert!(text.contains("list_artifacts"));
    // start + polls at 0, 10, 20 and 30 seconds
    assert_eq!(client.remote_calls(), 5);
}

#[tokio::test]
async fn test_generation_remote_failure() {
    let (client, registry, _dir) = setup();
    client.script_job(vec![
        JobStatusReport::running(),
        JobStatusReport::failed("quota exceeded"),
    ]);

    let result = registry
        .call_tool("generate_video", Some(json!({ "notebook_id": "nb-1" })))
        .await;
    assert!(result.is_error);
    let text = result.text();
    assert!(text.starts_with("[RemoteJobFailed]"));
    assert!(text.contains("quota exceeded"));
}

#[tokio::test]
async fn test_mind_map_returns_inline_tree() {
    let (client, registry, _dir) = setup();
    client.script_job(vec![JobStatusReport::succeeded(ArtifactRef {
        id: "mm-1".into(),
        kind: ArtifactKind::MindMap,
        title: None,
        content: Some(json!({ "name": "root", "children": [] })),
    })]);

    let text = ok_text(&registry, "generate_mindmap", json!({ "notebook_id": "nb-1" })).await;
    assert!(text.contains("\"name\": \"root\""));
}

#[tokio::test]
async fn test_auth_failure_surfaces_kind_and_hint() {
    let (client, registry, _dir) = setup();
    client.fail_auth();

    let result = registry
        .call_tool("notebook_list", Some(json!({})))
        .await;
    assert!(result.is_error);
    let text = result.text();
    assert!(text.starts_with("[AuthenticationRequired]"));
    assert!(text.contains("auth_refresh"));

    // auth_check reports the same failure as plain text.
    let check = registry.call_tool("auth_check", None).await;
    assert!(!check.is_error);
    assert!(check.text().starts_with("Authentication failed."));
}

#[tokio::test]
async fn test_download_writes_file() {
    let (client, registry, dir) = setup();
    client.set_artifact_bytes(b"# Report\n");

    let text = ok_text(
        &registry,
        "download_artifact",
        json!({ "notebook_id": "notebook-123456789", "artifact_type": "report" }),
    )
    .await;
    let expected = dir.path().join("report_notebook.md");
    assert_eq!(field(&text, "Path"), expected.display().to_string());
    assert_eq!(field(&text, "Size"), "9 bytes");
    assert_eq!(std::fs::read(&expected).unwrap(), b"# Report\n");
}

#[tokio::test]
async fn test_download_embeds_resource() {
    let (client, registry, dir) = setup();
    client.set_artifact_bytes(&[1, 2, 3]);
    let output = dir.path().join("nested").join("audio.mp3");

    let result = registry
        .call_tool(
            "download_artifact",
            Some(json!({
                "notebook_id": "nb-1",
                "artifact_type": "audio",
                "output_path": output.to_str().unwrap(),
                "embed": true
            })),
        )
        .await;
    assert!(!result.is_error);
    let value = serde_json::to_value(&result).unwrap();
    let resource = &value["content"][1]["resource"];
    assert_eq!(resource["mimeType"], "audio/mpeg");
    assert_eq!(resource["blob"], "AQID");
    assert!(output.exists());
}

#[tokio::test]
async fn test_research_and_import() {
    let (_client, registry, _dir) = setup();
    let text = ok_text(
        &registry,
        "research_web",
        json!({ "notebook_id": "nb-1", "query": "vector clocks" }),
    )
    .await;
    assert!(text.starts_with("Research completed (web, fast mode)"));

    let imported = ok_text(
        &registry,
        "research_import_sources",
        json!({
            "notebook_id": "nb-1",
            "task_id": "research-1",
            "sources": [{ "url": "https://example.com/finding", "title": "Finding" }]
        }),
    )
    .await;
    assert!(imported.contains("Finding"));
}

#[tokio::test]
async fn test_pipeline_runs_all_steps() {
    let (_client, registry, _dir) = setup();
    let text = ok_text(
        &registry,
        "research_pipeline",
        json!({ "topic": "CRDTs", "urls": ["https://crdt.tech"] }),
    )
    .await;

    for step in ["[1/5]", "[2/5]", "[3/5]", "[4/5]", "[5/5]"] {
        assert!(text.contains(step), "missing step {}", step);
    }
    assert!(text.contains("=== Pipeline Complete ==="));
}

#[tokio::test]
async fn test_add_file_uploads_local_file() {
    let (_client, registry, dir) = setup();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "meeting notes").unwrap();

    let text = ok_text(
        &registry,
        "source_add_file",
        json!({ "notebook_id": "nb-1", "file_path": path.to_str().unwrap() }),
    )
    .await;
    assert_eq!(field(&text, "Title"), "notes.txt");
    assert_eq!(field(&text, "Type"), "file");
}

#[tokio::test]
async fn test_add_missing_file_is_a_local_error() {
    let (client, registry, _dir) = setup();

    for (tool, arguments) in [
        ("source_add_file", json!({ "notebook_id": "nb-1", "file_path": "/no/such/paper.pdf" })),
        ("source_add", json!({ "notebook_id": "nb-1", "file_path": "/no/such/paper.pdf" })),
    ] {
        let result = registry.call_tool(tool, Some(arguments)).await;
        assert!(result.is_error);
        let text = result.text();
        assert!(text.starts_with("[IoError] local file /no/such/paper.pdf"), "{}", text);
        assert!(!text.contains("TransportError"));
    }
    assert_eq!(client.remote_calls(), 0);
}
