//! All-in-one research pipeline.
//!
//! Five steps run in order: create a notebook, add the given URLs, run web
//! research, ask for a summary, generate a report. Only the first step is
//! fatal; later failures are written into the transcript and the pipeline
//! carries on.

use serde::Deserialize;
use serde_json::{json, Value};

use super::validation::{
    validate_required, validate_url, ValidationError, ValidationErrors, Validator,
};
use super::{parse_arguments, with_wait_properties, ToolContext, ToolOutcome, ToolSpec, WaitArgs};
use crate::client::{
    ArtifactKind, GenerationOptions, GenerationRequest, NewSource, ResearchMode, ResearchSource,
    ReportFormat,
};
use crate::mcp::content::ContentBuilder;

pub(super) const TOOLS: &[ToolSpec] = &[ToolSpec {
    name: "research_pipeline",
    description: concat!(
        "Run an automated research pipeline: create a notebook for the topic, add the given URLs, ",
        "run web research for more sources, ask for a summary and generate a report. ",
        "Returns a step-by-step transcript with the notebook id."
    ),
    input_schema: pipeline_schema,
    handler: |ctx, args| Box::pin(run(ctx, args)),
}];

const RESEARCH_PREVIEW_CHARS: usize = 500;

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize)]
struct PipelineArgs {
    topic: String,
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default = "default_true")]
    web_research: bool,
    #[serde(default)]
    research_mode: ResearchMode,
    #[serde(default = "default_true")]
    generate_report: bool,
    #[serde(default)]
    report_format: ReportFormat,
    #[serde(default = "default_language")]
    language: String,
    #[serde(flatten)]
    wait: WaitArgs,
}

impl Validator for PipelineArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.topic, "topic", &mut errors);
        for (i, url) in self.urls.iter().enumerate() {
            validate_url(url, &format!("urls[{}]", i), &mut errors);
        }
        if self.report_format == ReportFormat::Custom {
            errors.add(
                ValidationError::new("report_format", "custom reports are not available in the pipeline")
                    .with_suggestion("Use briefing_doc, study_guide or blog_post"),
            );
        }
        self.wait.validate_into(&mut errors);
        errors.into_result()
    }
}

fn pipeline_schema() -> Value {
    with_wait_properties(json!({
        "type": "object",
        "properties": {
            "topic": { "type": "string", "description": "The research topic or question" },
            "urls": {
                "type": "array",
                "items": { "type": "string" },
                "description": "URLs to add as initial sources"
            },
            "web_research": {
                "type": "boolean",
                "description": "Run web research for additional sources (default: true)"
            },
            "research_mode": {
                "type": "string",
                "enum": ["fast", "deep"],
                "description": "Research depth (default: fast)"
            },
            "generate_report": {
                "type": "boolean",
                "description": "Generate a final report (default: true)"
            },
            "report_format": {
                "type": "string",
                "enum": ["briefing_doc", "study_guide", "blog_post"],
                "description": "Report type (default: briefing_doc)"
            },
            "language": { "type": "string", "description": "Language code (default: en)" }
        },
        "required": ["topic"]
    }))
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= RESEARCH_PREVIEW_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(RESEARCH_PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}

async fn run(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: PipelineArgs = parse_arguments(arguments)?;
    let topic = args.topic.trim();
    let client = &ctx.client;

    // [1/5] is the only step whose failure ends the pipeline.
    let notebook = client.create_notebook(&format!("Research: {}", topic)).await?;
    let mut out = ContentBuilder::heading(format!(
        "[1/5] Notebook created: {} (ID: {})",
        notebook.title, notebook.id
    ));

    let mut added = 0usize;
    if args.urls.is_empty() {
        out = out.line("[2/5] No URLs provided, skipping");
    } else {
        for url in &args.urls {
            let source = NewSource::Url {
                url: url.trim().to_string(),
            };
            match client.add_source(&notebook.id, source).await {
                Ok(source) => {
                    added += 1;
                    out = out.line(format!("  + Source added: {} ({})", source.title, url));
                }
                Err(err) => {
                    log::warn!("pipeline could not add {}: {}", url, err);
                    out = out.line(format!("  ! Failed to add {}: {}", url, err));
                }
            }
        }
        out = out.line(format!("[2/5] Added {} source(s) from URLs", added));
    }

    if args.web_research {
        match client
            .start_research(&notebook.id, topic, ResearchSource::Web, args.research_mode)
            .await
        {
            Ok(report) => {
                out = out.line(format!(
                    "[3/5] Web research completed ({} mode)",
                    args.research_mode.as_str()
                ));
                if let Some(report) = report {
                    out = out.line(format!(
                        "  Research result: {}",
                        preview(&Value::Object(report))
                    ));
                }
            }
            Err(err) => {
                log::warn!("pipeline web research failed: {}", err);
                out = out.line(format!("[3/5] Web research failed: {}", err));
            }
        }
    } else {
        out = out.line("[3/5] Web research skipped");
    }

    let question = format!(
        "Based on all available sources, provide a comprehensive summary of: {}. \
         Include key findings, main themes, and important details.",
        topic
    );
    match client.ask(&notebook.id, &question, None).await {
        Ok(answer) => {
            out = out
                .line("[4/5] Summary generated")
                .blank()
                .line("--- Summary ---")
                .line(answer.answer)
                .line("--- End Summary ---");
        }
        Err(err) => {
            log::warn!("pipeline summary failed: {}", err);
            out = out.line(format!("[4/5] Summary generation failed: {}", err));
        }
    }

    if args.generate_report {
        let request = GenerationRequest::new(GenerationOptions::Report {
            format: args.report_format,
            custom_prompt: None,
        })
        .language(args.language.clone());
        let schedule = args.wait.schedule(ArtifactKind::Report);

        let outcome = match client.start_generation(&notebook.id, &request).await {
            Ok(handle) => ctx.poller.wait(client.as_ref(), &handle, schedule).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(artifact) => {
                out = out
                    .line(format!(
                        "[5/5] Report generated (format: {}, artifact: {})",
                        args.report_format.as_str(),
                        artifact.id
                    ))
                    .line(format!(
                        "  Use download_artifact(notebook_id='{}', artifact_type='report') to download",
                        notebook.id
                    ));
            }
            Err(err) => {
                log::warn!("pipeline report failed: {}", err);
                out = out.line(format!("[5/5] Report generation failed: {}", err));
            }
        }
    } else {
        out = out.line("[5/5] Report generation skipped");
    }

    let research_note = if args.web_research { " + web research" } else { "" };
    Ok(out
        .blank()
        .line("=== Pipeline Complete ===")
        .line(format!("Notebook ID: {}", notebook.id))
        .line(format!("Topic: {}", topic))
        .line(format!("Sources: {} URL(s){}", added, research_note))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let descriptor = TOOLS[0].descriptor();
        assert_eq!(descriptor.name, "research_pipeline");
        assert_eq!(descriptor.input_schema["required"], json!(["topic"]));
    }

    #[test]
    fn test_defaults() {
        let args: PipelineArgs = parse_arguments(Some(json!({ "topic": "rust async" }))).unwrap();
        assert!(args.urls.is_empty());
        assert!(args.web_research);
        assert!(args.generate_report);
        assert_eq!(args.research_mode, ResearchMode::Fast);
        assert_eq!(args.report_format, ReportFormat::BriefingDoc);
    }

    #[test]
    fn test_bad_url_rejected_up_front() {
        let err = parse_arguments::<PipelineArgs>(Some(json!({
            "topic": "t",
            "urls": ["https://ok.example", "not a url"]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("[urls[1]]"));
    }

    #[test]
    fn test_preview_truncates() {
        let long = Value::String("x".repeat(600));
        let text = preview(&long);
        assert_eq!(text.chars().count(), RESEARCH_PREVIEW_CHARS + 3);
        assert!(text.ends_with("..."));
    }
}
