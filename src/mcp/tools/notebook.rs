//! Notebook management tools.

use serde::Deserialize;
use serde_json::{json, Value};

use super::validation::{validate_required, ValidationErrors, Validator};
use super::{parse_arguments, ToolContext, ToolOutcome, ToolSpec};
use crate::client::Notebook;
use crate::mcp::content::ContentBuilder;

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "notebook_create",
        description: "Create a new NotebookLM notebook. Returns the notebook id to use in every other tool.",
        input_schema: create_schema,
        handler: |ctx, args| Box::pin(create(ctx, args)),
    },
    ToolSpec {
        name: "notebook_list",
        description: "List all NotebookLM notebooks with their ids and titles.",
        input_schema: empty_schema,
        handler: |ctx, args| Box::pin(list(ctx, args)),
    },
    ToolSpec {
        name: "notebook_get",
        description: "Get details of a notebook, including its AI-generated summary when available.",
        input_schema: notebook_id_schema,
        handler: |ctx, args| Box::pin(get(ctx, args)),
    },
    ToolSpec {
        name: "notebook_delete",
        description: "Delete a notebook and everything in it.",
        input_schema: notebook_id_schema,
        handler: |ctx, args| Box::pin(delete(ctx, args)),
    },
    ToolSpec {
        name: "notebook_rename",
        description: "Rename a notebook.",
        input_schema: rename_schema,
        handler: |ctx, args| Box::pin(rename(ctx, args)),
    },
];

/// Arguments of every tool that only needs a notebook.
#[derive(Debug, Deserialize)]
pub(super) struct NotebookArgs {
    pub notebook_id: String,
}

impl Validator for NotebookArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    title: String,
}

impl Validator for CreateArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.title, "title", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct RenameArgs {
    notebook_id: String,
    new_title: String,
}

impl Validator for RenameArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.new_title, "new_title", &mut errors);
        errors.into_result()
    }
}

/// Tools that take no arguments still accept an empty object.
#[derive(Debug, Deserialize)]
pub(super) struct NoArgs {}

impl Validator for NoArgs {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

pub(super) fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

pub(super) fn notebook_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": {
                "type": "string",
                "description": "The ID of the notebook"
            }
        },
        "required": ["notebook_id"]
    })
}

fn create_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Title for the new notebook"
            }
        },
        "required": ["title"]
    })
}

fn rename_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": {
                "type": "string",
                "description": "The ID of the notebook to rename"
            },
            "new_title": {
                "type": "string",
                "description": "The new title"
            }
        },
        "required": ["notebook_id", "new_title"]
    })
}

fn created_at(notebook: &Notebook) -> Option<String> {
    notebook.created_at.map(|at| at.to_rfc3339())
}

async fn create(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: CreateArgs = parse_arguments(arguments)?;
    let notebook = ctx.client.create_notebook(args.title.trim()).await?;

    Ok(ContentBuilder::heading("Notebook created successfully.")
        .field("ID", &notebook.id)
        .field("Title", &notebook.title)
        .field_opt("Created", created_at(&notebook))
        .blank()
        .line("Use this notebook_id for subsequent operations.")
        .build())
}

async fn list(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let _: NoArgs = parse_arguments(arguments)?;
    let notebooks = ctx.client.list_notebooks().await?;
    if notebooks.is_empty() {
        return Ok(ContentBuilder::heading(
            "No notebooks found. Create one with notebook_create.",
        )
        .build());
    }

    let mut out = ContentBuilder::heading(format!("Found {} notebook(s):", notebooks.len()));
    for notebook in &notebooks {
        let created = created_at(notebook).unwrap_or_else(|| "unknown".to_string());
        out = out.line(format!(
            "  - [{}] {} (created: {})",
            notebook.id, notebook.title, created
        ));
    }
    Ok(out.build())
}

async fn get(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: NotebookArgs = parse_arguments(arguments)?;
    let notebook = ctx.client.get_notebook(&args.notebook_id).await?;
    let summary = ctx.client.notebook_summary(&args.notebook_id).await?;

    let mut out = ContentBuilder::heading(format!("Notebook: {}", notebook.title))
        .field("ID", &notebook.id)
        .field_opt("Created", created_at(&notebook));
    if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
        out = out.blank().line("Summary:").line(summary);
    }
    Ok(out.build())
}

async fn delete(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: NotebookArgs = parse_arguments(arguments)?;
    let deleted = ctx.client.delete_notebook(&args.notebook_id).await?;
    let out = if deleted {
        ContentBuilder::heading(format!("Notebook {} deleted successfully.", args.notebook_id))
    } else {
        ContentBuilder::heading(format!("Failed to delete notebook {}.", args.notebook_id))
            .error()
    };
    Ok(out.build())
}

async fn rename(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: RenameArgs = parse_arguments(arguments)?;
    let notebook = ctx
        .client
        .rename_notebook(&args.notebook_id, args.new_title.trim())
        .await?;
    Ok(ContentBuilder::heading(format!(
        "Notebook renamed to: {} (ID: {})",
        notebook.title, notebook.id
    ))
    .build())
}
