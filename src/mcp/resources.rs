//! Read-only MCP resources.

use serde::Serialize;

use crate::client::NotebookClient;

pub const NOTEBOOKS_URI: &str = "notebooklm://notebooks";
pub const STATUS_URI: &str = "notebooklm://status";

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

pub const RESOURCES: &[ResourceDescriptor] = &[
    ResourceDescriptor {
        uri: NOTEBOOKS_URI,
        name: "notebooks",
        description: "List all available notebooks.",
        mime_type: "text/plain",
    },
    ResourceDescriptor {
        uri: STATUS_URI,
        name: "status",
        description: "Server status and NotebookLM authentication state.",
        mime_type: "text/plain",
    },
];

/// Text of a resource, or `None` for an unknown URI.
///
/// The status resource reports connection problems in its text; the notebook
/// list reports them as `Err`.
pub async fn read(
    client: &(dyn NotebookClient + Send + Sync),
    uri: &str,
) -> Option<Result<String, String>> {
    match uri {
        NOTEBOOKS_URI => Some(notebooks(client).await),
        STATUS_URI => Some(Ok(status(client).await)),
        _ => None,
    }
}

async fn notebooks(client: &(dyn NotebookClient + Send + Sync)) -> Result<String, String> {
    let notebooks = client
        .list_notebooks()
        .await
        .map_err(|err| format!("[{}] {}", err.kind(), err))?;
    if notebooks.is_empty() {
        return Ok("No notebooks found.".to_string());
    }
    Ok(notebooks
        .iter()
        .map(|nb| format!("- [{}] {}", nb.id, nb.title))
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn status(client: &(dyn NotebookClient + Send + Sync)) -> String {
    match client.list_notebooks().await {
        Ok(notebooks) => format!(
            "Status: Connected\nNotebooks: {}\nAuthentication: Valid",
            notebooks.len()
        ),
        Err(err) => format!("Status: Not connected\nError: [{}] {}", err.kind(), err),
    }
}
