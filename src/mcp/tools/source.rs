//! Source management tools.
//!
//! The three `source_add_*` tools each take one payload kind. `source_add`
//! accepts any of them but insists on exactly one, and that check runs before
//! the client is touched.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{json, Value};

use super::chat::answer_with_references;
use super::notebook::NotebookArgs;
use super::validation::{
    validate_ids, validate_required, validate_required_opt, validate_url, ValidationError,
    ValidationErrors, Validator,
};
use super::{parse_arguments, ToolContext, ToolError, ToolOutcome, ToolSpec};
use crate::client::{NewSource, Source};
use crate::mcp::content::ContentBuilder;

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "source_add",
        description: concat!(
            "Add a source to a notebook. Pass exactly one of: url (web page, article, YouTube), ",
            "content (plain text, with an optional title) or file_path (local PDF, text, Markdown, ",
            "Word, audio, video or image)."
        ),
        input_schema: add_schema,
        handler: |ctx, args| Box::pin(add(ctx, args)),
    },
    ToolSpec {
        name: "source_add_url",
        description: "Add a URL as a source to a notebook. Supports web pages, articles and videos.",
        input_schema: add_url_schema,
        handler: |ctx, args| Box::pin(add_url(ctx, args)),
    },
    ToolSpec {
        name: "source_add_text",
        description: "Add plain text content as a source to a notebook.",
        input_schema: add_text_schema,
        handler: |ctx, args| Box::pin(add_text(ctx, args)),
    },
    ToolSpec {
        name: "source_add_file",
        description: "Upload a local file as a source (PDF, text, Markdown, Word, audio, video, images).",
        input_schema: add_file_schema,
        handler: |ctx, args| Box::pin(add_file(ctx, args)),
    },
    ToolSpec {
        name: "source_list",
        description: "List all sources in a notebook with their ids, titles, types and status.",
        input_schema: super::notebook::notebook_id_schema,
        handler: |ctx, args| Box::pin(list(ctx, args)),
    },
    ToolSpec {
        name: "source_get_fulltext",
        description: "Get the full indexed text of a source. Useful for RAG and analysis.",
        input_schema: source_id_schema,
        handler: |ctx, args| Box::pin(fulltext(ctx, args)),
    },
    ToolSpec {
        name: "source_get_guide",
        description: "Get the AI-generated study guide for a source.",
        input_schema: source_id_schema,
        handler: |ctx, args| Box::pin(guide(ctx, args)),
    },
    ToolSpec {
        name: "source_delete",
        description: "Delete a source from a notebook.",
        input_schema: source_id_schema,
        handler: |ctx, args| Box::pin(delete(ctx, args)),
    },
    ToolSpec {
        name: "source_compare",
        description: concat!(
            "Compare two or more sources side by side: overview, commonalities, differences, ",
            "unique contributions and a synthesis. Optionally focus on one aspect."
        ),
        input_schema: compare_schema,
        handler: |ctx, args| Box::pin(compare(ctx, args)),
    },
];

#[derive(Debug, Deserialize)]
struct AddArgs {
    notebook_id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
}

impl AddArgs {
    fn payload_count(&self) -> usize {
        [&self.url, &self.content, &self.file_path]
            .iter()
            .filter(|value| value.is_some())
            .count()
    }

    async fn into_source(self) -> Result<NewSource, ToolError> {
        if let Some(url) = self.url {
            return Ok(NewSource::Url {
                url: url.trim().to_string(),
            });
        }
        if let Some(content) = self.content {
            return Ok(NewSource::Text {
                title: self
                    .title
                    .filter(|title| !title.trim().is_empty())
                    .unwrap_or_else(|| "Pasted text".to_string()),
                content,
            });
        }
        match self.file_path {
            Some(path) => read_upload(&path).await,
            None => Err(ToolError::InvalidArguments("no source given".to_string())),
        }
    }
}

/// Read a local upload. A missing or unreadable file is a local error and
/// never reaches the client.
async fn read_upload(path: &str) -> Result<NewSource, ToolError> {
    let path = PathBuf::from(path.trim());
    let data = tokio::fs::read(&path).await.map_err(|source| ToolError::Io {
        path: path.clone(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(NewSource::File { file_name, data })
}

impl Validator for AddArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);

        match self.payload_count() {
            0 => errors.add(
                ValidationError::new("source", "no source given")
                    .with_suggestion("Pass one of url, content or file_path"),
            ),
            1 => {}
            _ => errors.add(
                ValidationError::new("source", "more than one source given")
                    .with_suggestion("Pass only one of url, content or file_path per call"),
            ),
        }

        if let Some(ref url) = self.url {
            validate_url(url, "url", &mut errors);
        }
        validate_required_opt(self.content.as_deref(), "content", &mut errors);
        validate_required_opt(self.file_path.as_deref(), "file_path", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct AddUrlArgs {
    notebook_id: String,
    url: String,
}

impl Validator for AddUrlArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_url(&self.url, "url", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct AddTextArgs {
    notebook_id: String,
    title: String,
    content: String,
}

impl Validator for AddTextArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.title, "title", &mut errors);
        validate_required(&self.content, "content", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct AddFileArgs {
    notebook_id: String,
    file_path: String,
}

impl Validator for AddFileArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.file_path, "file_path", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct SourceArgs {
    notebook_id: String,
    source_id: String,
}

impl Validator for SourceArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.source_id, "source_id", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct CompareArgs {
    notebook_id: String,
    source_ids: Vec<String>,
    #[serde(default)]
    aspect: Option<String>,
}

impl Validator for CompareArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_ids(&self.source_ids, "source_ids", 2, &mut errors);
        errors.into_result()
    }
}

fn add_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "url": { "type": "string", "description": "URL to add" },
            "content": { "type": "string", "description": "Plain text to add" },
            "title": { "type": "string", "description": "Title for a text source" },
            "file_path": { "type": "string", "description": "Path of a local file to upload" }
        },
        "required": ["notebook_id"]
    })
}

fn add_url_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "url": { "type": "string", "description": "The URL to add as a source" }
        },
        "required": ["notebook_id", "url"]
    })
}

fn add_text_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "title": { "type": "string", "description": "Title for the text source" },
            "content": { "type": "string", "description": "The text content to add" }
        },
        "required": ["notebook_id", "title", "content"]
    })
}

fn add_file_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "file_path": { "type": "string", "description": "Path to the local file to upload" }
        },
        "required": ["notebook_id", "file_path"]
    })
}

fn source_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "source_id": { "type": "string", "description": "The ID of the source" }
        },
        "required": ["notebook_id", "source_id"]
    })
}

fn compare_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "source_ids": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 2,
                "description": "Source IDs to compare (at least 2)"
            },
            "aspect": {
                "type": "string",
                "description": "Optional aspect to focus on, e.g. methodology or conclusions"
            }
        },
        "required": ["notebook_id", "source_ids"]
    })
}

fn added(heading: &str, source: &Source) -> ContentBuilder {
    ContentBuilder::heading(heading)
        .field("ID", &source.id)
        .field("Title", &source.title)
        .field("Type", &source.source_type)
        .field("Status", &source.status)
}

async fn add(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: AddArgs = parse_arguments(arguments)?;
    let notebook_id = args.notebook_id.clone();
    let source = args.into_source().await?;
    let source = ctx.client.add_source(&notebook_id, source).await?;
    Ok(added("Source added successfully.", &source).build())
}

async fn add_url(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: AddUrlArgs = parse_arguments(arguments)?;
    let source = ctx
        .client
        .add_source(
            &args.notebook_id,
            NewSource::Url {
                url: args.url.trim().to_string(),
            },
        )
        .await?;
    Ok(added("Source added successfully.", &source).build())
}

async fn add_text(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: AddTextArgs = parse_arguments(arguments)?;
    let source = ctx
        .client
        .add_source(
            &args.notebook_id,
            NewSource::Text {
                title: args.title,
                content: args.content,
            },
        )
        .await?;
    Ok(added("Text source added successfully.", &source).build())
}

async fn add_file(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: AddFileArgs = parse_arguments(arguments)?;
    let upload = read_upload(&args.file_path).await?;
    let source = ctx.client.add_source(&args.notebook_id, upload).await?;
    Ok(added("File source added successfully.", &source).build())
}

async fn list(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: NotebookArgs = parse_arguments(arguments)?;
    let sources = ctx.client.list_sources(&args.notebook_id).await?;
    if sources.is_empty() {
        return Ok(ContentBuilder::heading(
            "No sources in this notebook. Add sources with source_add_url, source_add_text, or source_add_file.",
        )
        .build());
    }

    let mut out = ContentBuilder::heading(format!("Found {} source(s):", sources.len()));
    for source in &sources {
        out = out.line(format!(
            "  - [{}] {} (type: {}, status: {})",
            source.id, source.title, source.source_type, source.status
        ));
    }
    Ok(out.build())
}

async fn fulltext(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: SourceArgs = parse_arguments(arguments)?;
    let text = ctx
        .client
        .source_fulltext(&args.notebook_id, &args.source_id)
        .await?;
    Ok(
        ContentBuilder::heading(format!("Source Fulltext (ID: {}):", args.source_id))
            .line(format!("Title: {}", text.title))
            .line(format!("Content length: {} chars", text.content.chars().count()))
            .blank()
            .line(text.content)
            .build(),
    )
}

async fn guide(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: SourceArgs = parse_arguments(arguments)?;
    let guide = ctx
        .client
        .source_guide(&args.notebook_id, &args.source_id)
        .await?;
    Ok(ContentBuilder::heading(format!("Source Guide (ID: {}):", args.source_id))
        .line(guide)
        .build())
}

async fn delete(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: SourceArgs = parse_arguments(arguments)?;
    let deleted = ctx
        .client
        .delete_source(&args.notebook_id, &args.source_id)
        .await?;
    let out = if deleted {
        ContentBuilder::heading(format!("Source {} deleted successfully.", args.source_id))
    } else {
        ContentBuilder::heading(format!("Failed to delete source {}.", args.source_id)).error()
    };
    Ok(out.build())
}

/// Structured comparison prompt sent through the chat endpoint.
fn comparison_prompt(count: usize, aspect: Option<&str>) -> String {
    match aspect {
        Some(aspect) => format!(
            "Compare the following {count} sources, focusing specifically on: {aspect}.\n\n\
             Structure your response as:\n\
             1. **Overview**: Brief description of each source\n\
             2. **Commonalities**: What the sources share regarding {aspect}\n\
             3. **Differences**: Key differences regarding {aspect}\n\
             4. **Unique Contributions**: What each source uniquely offers\n\
             5. **Synthesis**: Overall assessment"
        ),
        None => format!(
            "Compare the following {count} sources comprehensively.\n\n\
             Structure your response as:\n\
             1. **Overview**: Brief description of each source\n\
             2. **Commonalities**: Shared themes, arguments, or findings\n\
             3. **Differences**: Key disagreements or different perspectives\n\
             4. **Unique Contributions**: What each source uniquely offers\n\
             5. **Synthesis**: Overall assessment and how they complement each other"
        ),
    }
}

async fn compare(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: CompareArgs = parse_arguments(arguments)?;
    let aspect = args.aspect.as_deref().map(str::trim).filter(|a| !a.is_empty());
    let prompt = comparison_prompt(args.source_ids.len(), aspect);
    let answer = ctx
        .client
        .ask(&args.notebook_id, &prompt, Some(args.source_ids.as_slice()))
        .await?;

    let heading = format!("Source Comparison ({} sources):", args.source_ids.len());
    Ok(answer_with_references(ContentBuilder::heading(heading).blank(), &answer).build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let names: Vec<_> = TOOLS.iter().map(|t| t.name).collect();
        assert!(names.contains(&"source_add"));
        assert!(names.contains(&"source_compare"));
        let compare = TOOLS.iter().find(|t| t.name == "source_compare").unwrap();
        assert_eq!(compare.descriptor().input_schema["properties"]["source_ids"]["minItems"], 2);
    }

    #[test]
    fn test_add_requires_exactly_one_payload() {
        let none = parse_arguments::<AddArgs>(Some(json!({ "notebook_id": "nb" }))).unwrap_err();
        assert!(none.to_string().contains("no source given"));

        let two = parse_arguments::<AddArgs>(Some(json!({
            "notebook_id": "nb",
            "url": "https://example.com",
            "content": "text"
        })))
        .unwrap_err();
        assert!(two.to_string().contains("more than one source given"));
    }

    #[tokio::test]
    async fn test_add_text_defaults_title() {
        let args: AddArgs = parse_arguments(Some(json!({
            "notebook_id": "nb",
            "content": "hello"
        })))
        .unwrap();
        match args.into_source().await {
            Ok(NewSource::Text { title, content }) => {
                assert_eq!(title, "Pasted text");
                assert_eq!(content, "hello");
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_upload_keeps_file_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.md");
        std::fs::write(&path, b"# Paper").unwrap();

        match read_upload(path.to_str().unwrap()).await {
            Ok(NewSource::File { file_name, data }) => {
                assert_eq!(file_name, "paper.md");
                assert_eq!(data, b"# Paper");
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_upload_missing_file_is_io_error() {
        let err = read_upload("/no/such/paper.pdf").await.unwrap_err();
        assert_eq!(err.kind(), "IoError");
        assert!(err.to_string().contains("/no/such/paper.pdf"));
    }

    #[test]
    fn test_add_url_rejects_non_http() {
        let err = parse_arguments::<AddUrlArgs>(Some(json!({
            "notebook_id": "nb",
            "url": "file:///etc/passwd"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("not an http(s) URL"));
    }

    #[test]
    fn test_compare_needs_two_sources() {
        let err = parse_arguments::<CompareArgs>(Some(json!({
            "notebook_id": "nb",
            "source_ids": ["s1"]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_comparison_prompt_mentions_aspect() {
        let prompt = comparison_prompt(3, Some("methodology"));
        assert!(prompt.starts_with("Compare the following 3 sources, focusing specifically on: methodology."));
        assert!(prompt.contains("5. **Synthesis**"));
        assert!(!comparison_prompt(2, None).contains("focusing"));
    }
}
