//! Content generation tools.
//!
//! Every tool starts a remote job and then blocks on the [`JobPoller`] until
//! the artifact is ready, the job fails or the wait budget runs out. The
//! default budget depends on the artifact kind; `timeout_seconds` and
//! `poll_interval_seconds` override it per call.
//!
//! [`JobPoller`]: crate::poller::JobPoller

use serde::Deserialize;
use serde_json::{json, Value};

use super::validation::{validate_required, ValidationError, ValidationErrors, Validator};
use super::{parse_arguments, with_wait_properties, ToolContext, ToolError, ToolOutcome, ToolSpec, WaitArgs};
use crate::client::{
    ArtifactRef, AudioFormat, AudioLength, Difficulty, GenerationOptions, GenerationRequest,
    InfographicOrientation, JobHandle, QuizQuantity, ReportFormat, VideoStyle,
};
use crate::mcp::content::ContentBuilder;

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "generate_report",
        description: concat!(
            "Generate a report from the notebook's sources and wait for it: briefing_doc, study_guide, ",
            "blog_post, or custom together with custom_prompt."
        ),
        input_schema: report_schema,
        handler: |ctx, args| Box::pin(report(ctx, args)),
    },
    ToolSpec {
        name: "generate_audio",
        description: "Generate an audio overview (podcast) from the notebook's sources. Usually takes 2-5 minutes.",
        input_schema: audio_schema,
        handler: |ctx, args| Box::pin(audio(ctx, args)),
    },
    ToolSpec {
        name: "generate_quiz",
        description: "Generate a quiz from the notebook's sources.",
        input_schema: quiz_schema,
        handler: |ctx, args| Box::pin(quiz(ctx, args)),
    },
    ToolSpec {
        name: "generate_mindmap",
        description: "Generate a mind map of the notebook's sources and return its hierarchical JSON.",
        input_schema: plain_schema,
        handler: |ctx, args| Box::pin(mindmap(ctx, args)),
    },
    ToolSpec {
        name: "generate_flashcards",
        description: "Generate flashcards from the notebook's sources.",
        input_schema: quiz_schema,
        handler: |ctx, args| Box::pin(flashcards(ctx, args)),
    },
    ToolSpec {
        name: "generate_slides",
        description: "Generate a slide deck from the notebook's sources.",
        input_schema: plain_schema,
        handler: |ctx, args| Box::pin(slides(ctx, args)),
    },
    ToolSpec {
        name: "generate_video",
        description: "Generate a video overview from the notebook's sources. Takes several minutes.",
        input_schema: video_schema,
        handler: |ctx, args| Box::pin(video(ctx, args)),
    },
    ToolSpec {
        name: "generate_infographic",
        description: "Generate an infographic from the notebook's sources.",
        input_schema: infographic_schema,
        handler: |ctx, args| Box::pin(infographic(ctx, args)),
    },
    ToolSpec {
        name: "generate_data_table",
        description: concat!(
            "Generate a data table from the notebook's sources. Describe the table in instructions, ",
            "e.g. 'compare key concepts across papers'."
        ),
        input_schema: plain_schema,
        handler: |ctx, args| Box::pin(data_table(ctx, args)),
    },
];

/// Kind-specific option fields checked alongside the shared ones.
trait OptionFields {
    fn validate_into(&self, _errors: &mut ValidationErrors) {}
}

#[derive(Debug, Deserialize)]
struct GenerateArgs<T> {
    notebook_id: String,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default = "default_language")]
    language: String,
    #[serde(flatten)]
    options: T,
    #[serde(flatten)]
    wait: WaitArgs,
}

fn default_language() -> String {
    "en".to_string()
}

impl<T: OptionFields> Validator for GenerateArgs<T> {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.language, "language", &mut errors);
        self.options.validate_into(&mut errors);
        self.wait.validate_into(&mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct NoOptions {}

impl OptionFields for NoOptions {}

#[derive(Debug, Deserialize)]
struct ReportOptions {
    #[serde(default)]
    report_format: ReportFormat,
    #[serde(default)]
    custom_prompt: Option<String>,
}

impl OptionFields for ReportOptions {
    fn validate_into(&self, errors: &mut ValidationErrors) {
        let has_prompt = self
            .custom_prompt
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        if self.report_format == ReportFormat::Custom && !has_prompt {
            errors.add(
                ValidationError::new("custom_prompt", "required when report_format is custom")
                    .with_suggestion("Describe the report you want in custom_prompt"),
            );
        }
    }
}

#[derive(Debug, Deserialize)]
struct AudioOptions {
    #[serde(default)]
    audio_format: Option<AudioFormat>,
    #[serde(default)]
    audio_length: Option<AudioLength>,
}

impl OptionFields for AudioOptions {}

#[derive(Debug, Deserialize)]
struct CardOptions {
    #[serde(default)]
    quantity: Option<QuizQuantity>,
    #[serde(default)]
    difficulty: Option<Difficulty>,
}

impl OptionFields for CardOptions {}

#[derive(Debug, Deserialize)]
struct VideoOptions {
    #[serde(default)]
    style: Option<VideoStyle>,
}

impl OptionFields for VideoOptions {}

#[derive(Debug, Deserialize)]
struct InfographicOptions {
    #[serde(default)]
    orientation: Option<InfographicOrientation>,
}

impl OptionFields for InfographicOptions {}

fn base_schema(extra: Value) -> Value {
    let mut properties = json!({
        "notebook_id": { "type": "string", "description": "The ID of the notebook" },
        "instructions": { "type": "string", "description": "Custom instructions for the generation" },
        "language": { "type": "string", "description": "Language code such as en, ko or ja (default: en)" }
    });
    if let (Some(base), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        base.extend(extra);
    }
    with_wait_properties(json!({
        "type": "object",
        "properties": properties,
        "required": ["notebook_id"]
    }))
}

fn plain_schema() -> Value {
    base_schema(json!({}))
}

fn report_schema() -> Value {
    base_schema(json!({
        "report_format": {
            "type": "string",
            "enum": ["briefing_doc", "study_guide", "blog_post", "custom"],
            "description": "Report type (default: briefing_doc)"
        },
        "custom_prompt": {
            "type": "string",
            "description": "Instructions for the report; required with report_format=custom"
        }
    }))
}

fn audio_schema() -> Value {
    base_schema(json!({
        "audio_format": {
            "type": "string",
            "enum": ["deep_dive", "brief", "critique", "debate"]
        },
        "audio_length": {
            "type": "string",
            "enum": ["short", "medium", "long"]
        }
    }))
}

fn quiz_schema() -> Value {
    base_schema(json!({
        "quantity": {
            "type": "string",
            "enum": ["fewer", "standard", "more"],
            "description": "How many items to generate"
        },
        "difficulty": {
            "type": "string",
            "enum": ["easy", "medium", "hard"]
        }
    }))
}

fn video_schema() -> Value {
    base_schema(json!({
        "style": {
            "type": "string",
            "enum": ["classic", "whiteboard", "kawaii", "anime"],
            "description": "Visual style"
        }
    }))
}

fn infographic_schema() -> Value {
    base_schema(json!({
        "orientation": {
            "type": "string",
            "enum": ["portrait", "landscape", "square"]
        }
    }))
}

/// Start the job and wait for its artifact.
async fn start_and_wait<T>(
    ctx: &ToolContext,
    args: GenerateArgs<T>,
    options: GenerationOptions,
) -> Result<(JobHandle, ArtifactRef), ToolError> {
    let kind = options.kind();
    let schedule = args.wait.schedule(kind);
    let instructions = args.instructions.filter(|i| !i.trim().is_empty());
    let request = GenerationRequest::new(options)
        .language(args.language)
        .instructions(instructions);

    let handle = ctx
        .client
        .start_generation(&args.notebook_id, &request)
        .await?;
    log::info!(
        "started {} generation for notebook {} (task {}, waiting up to {}s)",
        kind,
        args.notebook_id,
        handle.task_id,
        schedule.max_wait.as_secs()
    );

    let artifact = ctx
        .poller
        .wait(ctx.client.as_ref(), &handle, schedule)
        .await?;
    Ok((handle, artifact))
}

fn finished(heading: &str, handle: &JobHandle, artifact: &ArtifactRef) -> ContentBuilder {
    ContentBuilder::heading(heading)
        .field("Task ID", &handle.task_id)
        .field("Status", "succeeded")
        .field("Artifact ID", &artifact.id)
        .field_opt("Title", artifact.title.as_deref())
}

fn download_hint(kind: &str, note: &str) -> String {
    format!("Use download_artifact with artifact_type='{}' to download{}.", kind, note)
}

async fn report(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let mut args: GenerateArgs<ReportOptions> = parse_arguments(arguments)?;
    let format = args.options.report_format;
    let options = GenerationOptions::Report {
        format,
        custom_prompt: args.options.custom_prompt.take(),
    };
    let (handle, artifact) = start_and_wait(ctx, args, options).await?;

    Ok(finished("Report generated successfully.", &handle, &artifact)
        .field("Format", format.as_str())
        .blank()
        .line(download_hint("report", " as Markdown"))
        .build())
}

async fn audio(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: GenerateArgs<AudioOptions> = parse_arguments(arguments)?;
    let options = GenerationOptions::Audio {
        format: args.options.audio_format,
        length: args.options.audio_length,
    };
    let (handle, artifact) = start_and_wait(ctx, args, options).await?;

    Ok(finished("Audio overview generated.", &handle, &artifact)
        .blank()
        .line(download_hint("audio", " as MP3"))
        .build())
}

async fn quiz(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: GenerateArgs<CardOptions> = parse_arguments(arguments)?;
    let options = GenerationOptions::Quiz {
        quantity: args.options.quantity,
        difficulty: args.options.difficulty,
    };
    let (handle, artifact) = start_and_wait(ctx, args, options).await?;

    Ok(finished("Quiz generated.", &handle, &artifact)
        .blank()
        .line(download_hint("quiz", " (JSON/Markdown/HTML)"))
        .build())
}

async fn flashcards(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: GenerateArgs<CardOptions> = parse_arguments(arguments)?;
    let options = GenerationOptions::Flashcards {
        quantity: args.options.quantity,
        difficulty: args.options.difficulty,
    };
    let (handle, artifact) = start_and_wait(ctx, args, options).await?;

    Ok(finished("Flashcards generated.", &handle, &artifact)
        .blank()
        .line(download_hint("flashcards", " (JSON/Markdown/HTML)"))
        .build())
}

async fn mindmap(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: GenerateArgs<NoOptions> = parse_arguments(arguments)?;
    let (handle, artifact) = start_and_wait(ctx, args, GenerationOptions::MindMap).await?;

    let out = match artifact.content {
        Some(ref tree) => ContentBuilder::heading("Mind map generated:").json(tree),
        None => finished("Mind map generated.", &handle, &artifact)
            .blank()
            .line(download_hint("mind_map", " as JSON")),
    };
    Ok(out.build())
}

async fn slides(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: GenerateArgs<NoOptions> = parse_arguments(arguments)?;
    let (handle, artifact) = start_and_wait(ctx, args, GenerationOptions::SlideDeck).await?;

    Ok(finished("Slide deck generated.", &handle, &artifact)
        .blank()
        .line(download_hint("slide_deck", " as PDF"))
        .build())
}

async fn video(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: GenerateArgs<VideoOptions> = parse_arguments(arguments)?;
    let options = GenerationOptions::Video {
        style: args.options.style,
    };
    let (handle, artifact) = start_and_wait(ctx, args, options).await?;

    Ok(finished("Video overview generated.", &handle, &artifact)
        .blank()
        .line(download_hint("video", " as MP4"))
        .build())
}

async fn infographic(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: GenerateArgs<InfographicOptions> = parse_arguments(arguments)?;
    let options = GenerationOptions::Infographic {
        orientation: args.options.orientation,
    };
    let (handle, artifact) = start_and_wait(ctx, args, options).await?;

    Ok(finished("Infographic generated.", &handle, &artifact)
        .blank()
        .line(download_hint("infographic", " as PNG"))
        .build())
}

async fn data_table(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: GenerateArgs<NoOptions> = parse_arguments(arguments)?;
    let (handle, artifact) = start_and_wait(ctx, args, GenerationOptions::DataTable).await?;

    Ok(finished("Data table generated.", &handle, &artifact)
        .blank()
        .line(download_hint("data_table", " as CSV"))
        .build())
}
