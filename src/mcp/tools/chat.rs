//! Retrieval-augmented Q&A over a notebook's sources.

use serde::Deserialize;
use serde_json::{json, Value};

use super::validation::{validate_ids, validate_required, ValidationErrors, Validator};
use super::{parse_arguments, ToolContext, ToolOutcome, ToolSpec};
use crate::client::ChatAnswer;
use crate::mcp::content::ContentBuilder;

pub(super) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "chat_ask",
        description: concat!(
            "Ask a question about the sources in a notebook (RAG Q&A). The answer is grounded in ",
            "the notebook's sources and lists its citations. Optionally restrict it to source_ids."
        ),
        input_schema: ask_schema,
        handler: |ctx, args| Box::pin(ask(ctx, args)),
    },
    ToolSpec {
        name: "chat_ask_specific_sources",
        description: "Ask a question answered only from the listed sources, e.g. to contrast two papers.",
        input_schema: ask_specific_schema,
        handler: |ctx, args| Box::pin(ask_specific(ctx, args)),
    },
    ToolSpec {
        name: "chat_configure",
        description: "Set a custom system prompt that shapes how the notebook's chat answers. Omit it to restore the default.",
        input_schema: configure_schema,
        handler: |ctx, args| Box::pin(configure(ctx, args)),
    },
];

#[derive(Debug, Deserialize)]
struct AskArgs {
    notebook_id: String,
    question: String,
    #[serde(default)]
    source_ids: Option<Vec<String>>,
}

impl Validator for AskArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.question, "question", &mut errors);
        if let Some(ref ids) = self.source_ids {
            validate_ids(ids, "source_ids", 0, &mut errors);
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct AskSpecificArgs {
    notebook_id: String,
    question: String,
    source_ids: Vec<String>,
}

impl Validator for AskSpecificArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        validate_required(&self.question, "question", &mut errors);
        validate_ids(&self.source_ids, "source_ids", 1, &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct ConfigureArgs {
    notebook_id: String,
    #[serde(default)]
    custom_prompt: Option<String>,
}

impl Validator for ConfigureArgs {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.notebook_id, "notebook_id", &mut errors);
        errors.into_result()
    }
}

fn ask_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook containing sources" },
            "question": { "type": "string", "description": "The question to ask about the sources" },
            "source_ids": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Optional source IDs to query against; all sources when omitted"
            }
        },
        "required": ["notebook_id", "question"]
    })
}

fn ask_specific_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "question": { "type": "string", "description": "The question to ask" },
            "source_ids": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 1,
                "description": "Source IDs to limit the query to"
            }
        },
        "required": ["notebook_id", "question", "source_ids"]
    })
}

fn configure_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "notebook_id": { "type": "string", "description": "The ID of the notebook" },
            "custom_prompt": {
                "type": "string",
                "description": "System prompt for the chat, e.g. 'You are an expert in machine learning. Always cite specific papers.'"
            }
        },
        "required": ["notebook_id"]
    })
}

/// Append the answer text and its citation list.
pub(super) fn answer_with_references(out: ContentBuilder, answer: &ChatAnswer) -> ContentBuilder {
    let mut out = out.line(answer.answer.clone());
    if !answer.references.is_empty() {
        out = out.blank().line("References:");
        for citation in &answer.references {
            out = out.line(format!("  - {}", citation));
        }
    }
    out
}

async fn ask(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: AskArgs = parse_arguments(arguments)?;
    let scope = args.source_ids.as_deref().filter(|ids| !ids.is_empty());
    let answer = ctx
        .client
        .ask(&args.notebook_id, &args.question, scope)
        .await?;
    Ok(answer_with_references(ContentBuilder::heading("Answer:"), &answer).build())
}

async fn ask_specific(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: AskSpecificArgs = parse_arguments(arguments)?;
    let answer = ctx
        .client
        .ask(
            &args.notebook_id,
            &args.question,
            Some(args.source_ids.as_slice()),
        )
        .await?;
    let heading = format!(
        "Answer (from {} selected source(s)):",
        args.source_ids.len()
    );
    Ok(answer_with_references(ContentBuilder::heading(heading), &answer).build())
}

async fn configure(ctx: &ToolContext, arguments: Option<Value>) -> ToolOutcome {
    let args: ConfigureArgs = parse_arguments(arguments)?;
    let prompt = args
        .custom_prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    ctx.client.configure_chat(&args.notebook_id, prompt).await?;
    Ok(
        ContentBuilder::heading(format!("Chat configured for notebook {}.", args.notebook_id))
            .line(format!("Custom prompt: {}", prompt.unwrap_or("(default)")))
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Citation;

    #[test]
    fn test_descriptor() {
        let ask = TOOLS[0].descriptor();
        assert_eq!(ask.name, "chat_ask");
        assert_eq!(ask.input_schema["required"], json!(["notebook_id", "question"]));
    }

    #[test]
    fn test_answer_lists_references() {
        let answer = ChatAnswer {
            answer: "Rust is memory safe.".into(),
            references: vec![Citation {
                citation_number: Some(1),
                source_id: "src-1".into(),
                cited_text: Some("ownership".into()),
            }],
        };
        let text = answer_with_references(ContentBuilder::heading("Answer:"), &answer)
            .build()
            .text();
        assert_eq!(
            text,
            "Answer:\nRust is memory safe.\n\nReferences:\n  - [1] source src-1: \"ownership\""
        );
    }

    #[test]
    fn test_specific_sources_required() {
        let err = parse_arguments::<AskSpecificArgs>(Some(json!({
            "notebook_id": "nb",
            "question": "q",
            "source_ids": []
        })))
        .unwrap_err();
        assert!(err.to_string().contains("source_ids"));
    }
}
