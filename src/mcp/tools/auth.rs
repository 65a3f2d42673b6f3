//! Session checks.
//!
//! Both tools report auth failures as regular text instead of tool errors,
//! so an agent can use them as a health check.

use serde_json::Value;

use super::notebook::{empty_schema, NoArgs};
use super::{parse_arguments, ToolContext, ToolOutcome, ToolSpec};
use crate::mcp::content::ContentBuilder;

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "auth_check",
        description: "Check that the stored NotebookLM session is valid by listing notebooks.",
        input_schema: empty_schema,
        handler: |ctx, args| Box::pin(check(ctx, args)),
    },
    ToolSpec {
        name: "auth_refresh",
        description: "Reload the NotebookLM session from disk, e.g. after re-running the login script.",
        input_schema: empty_schema,
        handler: |ctx, args| Box::pin(refresh(ctx, args)),
    },
];

async fn check(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let _: NoArgs = parse_arguments(arguments)?;
    let out = match ctx.client.list_notebooks().await {
        Ok(notebooks) => ContentBuilder::heading("Authentication is valid.")
            .field("Status", "Connected")
            .field("Notebooks accessible", notebooks.len()),
        Err(err) => {
            log::warn!("auth check failed: {}", err);
            ContentBuilder::heading("Authentication failed.")
                .field("Error", format!("[{}] {}", err.kind(), err))
        }
    };
    Ok(out.build())
}

async fn refresh(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let _: NoArgs = parse_arguments(arguments)?;
    let out = match ctx.client.refresh_auth().await {
        Ok(()) => ContentBuilder::heading("Authentication session reloaded successfully."),
        Err(err) => {
            log::warn!("auth refresh failed: {}", err);
            ContentBuilder::heading("Failed to refresh authentication.")
                .field("Error", format!("[{}] {}", err.kind(), err))
        }
    };
    Ok(out.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let names: Vec<_> = TOOLS.iter().map(|t| t.descriptor().name).collect();
        assert_eq!(names, vec!["auth_check", "auth_refresh"]);
        assert_eq!((TOOLS[0].input_schema)()["properties"], serde_json::json!({}));
    }
}
