//! Web and Drive research tools.

use serde::Deserialize;
use serde_json::{json, Value};

use super::notebook::NotebookArgs;
use super::validation::{validate_required, validate_url, ValidationError, ValidationErrors, Validator};
use super::{parse_arguments, ToolContext, ToolOutcome, ToolSpec};
use crate::client::{DiscoveredSource, ResearchMode, ResearchReport, ResearchSource};
use crate::mcp::content::ContentBuilder;

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "research_web",
        description: concat!(
            "Run a web research query. NotebookLM's research agent searches the web and can add ",
            "the sources it discovers to the notebook."
        ),
        input_schema: research_schema,
        handler: |ctx, args| Box::pin(web(ctx, args)),
    },
    ToolSpec {
        name: "research_drive",
        description: "Run a research query over your Google Drive documents.",
        input_schema: research_schema,
        handler: |ctx, args| Box::pin(drive(ctx, args)),
    },
    ToolSpec {
        name: "research_poll",
        description: "Check the status of a notebook's ongoing research task.",
        input_schema: super::notebook::notebook_id_schema,
        handler: |ctx, args| Box::pin(poll(ctx, args)),
    },
    ToolSpec {
        name: "research_import_sources",
        description: concat!(
            "Import selected sources discovered by research_web or research_drive into the notebook. ",
            "Each source needs a url and may carry a title."
        ),
        input_schema: import_schema,
        handler: |ctx, args| Box::pin(import(ctx, args)),
    },
];

#[derive(Debug, Deserialize)]
struct ResearchArgs {
    notebook_id: String,
    query: String,
    #[serde(default)]
    mode: ResearchMode,
}

impl Validator for ResearchArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.query, "query", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct ImportArgs {
    notebook_id: String,
    task_id: String,
    sources: Vec<DiscoveredSource>,
}

impl Validator for ImportArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.task_id, "task_id", &mut errors);
        if self.sources.is_empty() {
            errors.add(ValidationError::new("sources", "at least one source is required"));
        }
        for (i, source) in self.sources.iter().enumerate() {
            validate_url(&source.url, &format!("sources[{}].url", i), &mut errors);
        }
        errors.into_result()
    }
}

fn research_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "query": { "type": "string", "description": "The research query or topic" },
            "mode": {
                "type": "string",
                "enum": ["fast", "deep"],
                "description": "fast for quick results, deep for thorough research (default: fast)"
            }
        },
        "required": ["notebook_id", "query"]
    })
}

fn import_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "task_id": { "type": "string", "description": "Task ID from the research result" },
            "sources": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "url": { "type": "string" },
                        "title": { "type": "string" }
                    },
                    "required": ["url"]
                },
                "description": "Discovered sources to import"
            }
        },
        "required": ["notebook_id", "task_id", "sources"]
    })
}

/// Scalars print bare; everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_report(
    out: ContentBuilder,
    report: &ResearchReport,
) -> ContentBuilder {
    report.iter().fold(out, |out, (key, value)| {
        out.line(format!("  {}: {}", key, display_value(value)))
    })
}

async fn run(ctx: &ToolContext, arguments: Option<Value>, source: ResearchSource) -> ToolOutcome {
    let args: ResearchArgs = parse_arguments(arguments)?;
    let report = ctx
        .client
        .start_research(&args.notebook_id, args.query.trim(), source, args.mode)
        .await?;

    let report = match report {
        Some(report) => report,
        None => {
            return Ok(ContentBuilder::heading(
                "Research started but no immediate results. Use research_poll to check status.",
            )
            .build())
        }
    };

    let out = ContentBuilder::heading(format!(
        "Research completed ({}, {} mode)",
        source.as_str(),
        args.mode.as_str()
    ))
    .line(format!("Query: {}", args.query.trim()))
    .blank()
    .line("Results:");
    Ok(format_report(out, &report).build())
}

async fn web(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    run(ctx, arguments, ResearchSource::Web).await
}

async fn drive(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    run(ctx, arguments, ResearchSource::Drive).await
}

async fn poll(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: NotebookArgs = parse_arguments(arguments)?;
    let status = ctx.client.poll_research(&args.notebook_id).await?;
    Ok(ContentBuilder::heading("Research status:").json(&status).build())
}

async fn import(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: ImportArgs = parse_arguments(arguments)?;
    let imported = ctx
        .client
        .import_research_sources(&args.notebook_id, &args.task_id, &args.sources)
        .await?;

    let mut out = ContentBuilder::heading(format!(
        "Imported {} source(s) from research results.",
        imported.len()
    ));
    for source in &imported {
        out = out.line(format!("  - [{}] {}", source.id, source.title));
    }
    Ok(out.build())
}
