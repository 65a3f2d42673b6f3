//! Download and listing of generated artifacts.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{json, Value};

use super::validation::{validate_required, validate_required_opt, ValidationErrors, Validator};
use super::{parse_arguments, ToolContext, ToolError, ToolOutcome, ToolSpec};
use crate::client::{ArtifactKind, DownloadFormat};
use crate::mcp::content::{ContentBuilder, EmbeddedResource};

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "download_artifact",
        description: concat!(
            "Download a generated artifact to a local file: audio (MP3), video (MP4), report (Markdown), ",
            "quiz or flashcards (JSON/Markdown/HTML), slide_deck (PDF), infographic (PNG), mind_map (JSON) ",
            "or data_table (CSV). Set embed=true to also return the bytes inline."
        ),
        input_schema: download_schema,
        handler: |ctx, args| Box::pin(download(ctx, args)),
    },
    ToolSpec {
        name: "list_artifacts",
        description: "List generated artifacts in a notebook, optionally filtered by type.",
        input_schema: list_schema,
        handler: |ctx, args| Box::pin(list(ctx, args)),
    },
];

#[derive(Debug, Deserialize)]
struct DownloadArgs {
    notebook_id: String,
    artifact_type: ArtifactKind,
    #[serde(default)]
    output_path: Option<String>,
    #[serde(default)]
    output_format: Option<DownloadFormat>,
    #[serde(default)]
    embed: bool,
}

impl Validator for DownloadArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required_opt(self.output_path.as_deref(), "output_path", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    notebook_id: String,
    #[serde(default)]
    artifact_type: Option<ArtifactKind>,
}

impl Validator for ListArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        errors.into_result()
    }
}

fn kind_names() -> Vec<&'static str> {
    ArtifactKind::ALL.iter().map(ArtifactKind::as_str).collect()
}

fn download_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "artifact_type": {
                "type": "string",
                "enum": kind_names(),
                "description": "Type of artifact to download"
            },
            "output_path": {
                "type": "string",
                "description": "File to write; defaults to the download directory with a generated name"
            },
            "output_format": {
                "type": "string",
                "enum": ["json", "markdown", "html"],
                "description": "Format for quiz and flashcards (default: json)"
            },
            "embed": {
                "type": "boolean",
                "description": "Also return the file content base64-encoded (default: false)"
            }
        },
        "required": ["notebook_id", "artifact_type"]
    })
}

fn list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "artifact_type": {
                "type": "string",
                "enum": kind_names(),
                "description": "Only list artifacts of this type"
            }
        },
        "required": ["notebook_id"]
    })
}

/// `<dir>/<kind>_<first 8 chars of notebook id>.<ext>`, sanitized.
fn default_download_path(
    dir: &Path,
    kind: ArtifactKind,
    notebook_id: &str,
    format: DownloadFormat,
) -> PathBuf {
    let prefix: String = notebook_id.chars().take(8).collect();
    let name = format!("{}_{}.{}", kind, prefix, kind.extension(format));
    dir.join(sanitize_filename::sanitize(name))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ToolError> {
    let io_error = |source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(path, bytes).await.map_err(io_error)
}

async fn download(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: DownloadArgs = parse_arguments(arguments)?;
    let kind = args.artifact_type;
    let format = args.output_format.unwrap_or_default();

    let path = match args.output_path {
        Some(ref path) => PathBuf::from(path.trim()),
        None => default_download_path(&ctx.download_dir, kind, &args.notebook_id, format),
    };

    let bytes = ctx
        .client
        .download_artifact(&args.notebook_id, kind, format)
        .await?;
    write_file(&path, &bytes).await?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    log::info!(
        "saved {} artifact of notebook {} to {} ({} bytes)",
        kind,
        args.notebook_id,
        path.display(),
        bytes.len()
    );

    let mut out = ContentBuilder::heading("Artifact downloaded successfully.")
        .field("Type", kind)
        .field("Path", path.display())
        .field("Size", format!("{} bytes", bytes.len()))
        .field("MIME type", &mime);
    if args.embed {
        let uri = format!("file://{}", path.display());
        out = out.resource(EmbeddedResource::blob(uri, mime.essence_str(), &bytes));
    }
    Ok(out.build())
}

async fn list(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: ListArgs = parse_arguments(arguments)?;
    let artifacts = ctx
        .client
        .list_artifacts(&args.notebook_id, args.artifact_type)
        .await?;
    if artifacts.is_empty() {
        return Ok(
            ContentBuilder::heading("No artifacts found. Generate some with generate_* tools.")
                .build(),
        );
    }

    let mut out = ContentBuilder::heading(format!("Found {} artifact(s):", artifacts.len()));
    for artifact in &artifacts {
        let mut line = format!(
            "  - [{}] type={}, title={}",
            artifact.id, artifact.kind, artifact.title
        );
        if let Some(status) = artifact.status {
            line.push_str(&format!(", status={}", status.as_str()));
        }
        out = out.line(line);
    }
    Ok(out.build())
}
