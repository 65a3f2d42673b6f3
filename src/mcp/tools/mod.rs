//! MCP tools exposed via JSON-RPC.
//!
//! Every tool is one [`ToolSpec`] entry in a static table: name, description,
//! input schema and an async handler. Handlers parse their arguments into a
//! typed struct, validate it, call the shared [`NotebookClient`] and format the
//! outcome with [`ContentBuilder`].
//!
//! [`NotebookClient`]: crate::client::NotebookClient
//! [`ContentBuilder`]: crate::mcp::content::ContentBuilder

mod artifacts;
mod auth;
mod chat;
mod generate;
mod notebook;
mod pipeline;
pub mod registry;
mod research;
mod source;
pub mod validation;

use std::path::PathBuf;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::client::{ArtifactKind, PollSchedule, SharedClient};
use crate::error::NotebookError;
use crate::mcp::content::ToolResult;
use crate::poller::JobPoller;

pub use registry::ToolRegistry;
pub use validation::Validator;
use validation::{validate_range, ValidationErrors};

/// Everything a tool handler may touch.
#[derive(Clone)]
pub struct ToolContext {
    pub client: SharedClient,
    pub poller: JobPoller,
    pub download_dir: PathBuf,
}

impl ToolContext {
    pub fn new(client: SharedClient, poller: JobPoller, download_dir: PathBuf) -> Self {
        Self {
            client,
            poller,
            download_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Remote(#[from] NotebookError),

    #[error("local file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArguments(_) => "InvalidArguments",
            Self::Remote(err) => err.kind(),
            Self::Io { .. } => "IoError",
        }
    }

    /// Tool result with `isError` set and a `[Kind] message` text.
    pub fn into_result(self) -> ToolResult {
        let mut text = format!("[{}] {}", self.kind(), self);
        if let Some(hint) = self.hint() {
            text.push('\n');
            text.push_str(hint);
        }
        ToolResult::error(text)
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArguments(_) | Self::Io { .. } => None,
            Self::Remote(err) => match err {
                NotebookError::AuthenticationRequired(_) | NotebookError::Session(_) => {
                    Some("Hint: run the login script, then call auth_refresh.")
                }
                NotebookError::PollTimeout { .. } => Some(
                    "Hint: the job was not cancelled; check list_artifacts later and download it when ready.",
                ),
                NotebookError::RateLimited { .. } => {
                    Some("Hint: wait before sending more generation requests.")
                }
                _ => None,
            },
        }
    }
}

pub type ToolOutcome = Result<ToolResult, ToolError>;

pub type ToolFuture<'a> = BoxFuture<'a, ToolOutcome>;

pub type ToolHandler = for<'a> fn(&'a ToolContext, Option<Value>) -> ToolFuture<'a>;

/// Static registration entry for a tool.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
    pub handler: ToolHandler,
}

/// Entry of a `tools/list` reply.
#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: (self.input_schema)(),
        }
    }
}

/// Deserialize and validate tool arguments. Missing arguments count as `{}`.
pub fn parse_arguments<T>(arguments: Option<Value>) -> Result<T, ToolError>
where
    T: DeserializeOwned + Validator,
{
    let value = match arguments {
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(value) => value,
    };
    let parsed: T = serde_json::from_value(value)
        .map_err(|err| ToolError::InvalidArguments(format!("Invalid arguments: {}", err)))?;
    parsed.validate().map_err(ToolError::InvalidArguments)?;
    Ok(parsed)
}

/// Polling overrides accepted by every tool that waits on a job.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WaitArgs {
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub poll_interval_seconds: Option<u64>,
}

impl WaitArgs {
    pub fn validate_into(&self, errors: &mut ValidationErrors) {
        validate_range(self.timeout_seconds, "timeout_seconds", 1, 3600, errors);
        validate_range(self.poll_interval_seconds, "poll_interval_seconds", 1, 600, errors);
    }

    /// Kind default with the caller's overrides applied.
    pub fn schedule(&self, kind: ArtifactKind) -> PollSchedule {
        let default = kind.default_schedule();
        PollSchedule::new(
            self.poll_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(default.interval),
            self.timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(default.max_wait),
        )
    }
}

/// Add the polling override properties to an object schema.
pub(crate) fn with_wait_properties(mut schema: Value) -> Value {
    if let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) {
        properties.insert(
            "timeout_seconds".to_string(),
            serde_json::json!({
                "type": "integer",
                "minimum": 1,
                "maximum": 3600,
                "description": "Maximum time to wait for the job (default depends on the artifact type)"
            }),
        );
        properties.insert(
            "poll_interval_seconds".to_string(),
            serde_json::json!({
                "type": "integer",
                "minimum": 1,
                "maximum": 600,
                "description": "Seconds between status checks (default depends on the artifact type)"
            }),
        );
    }
    schema
}

/// Every registered tool, in catalog order.
pub(crate) fn all_tools() -> impl Iterator<Item = &'static ToolSpec> {
    notebook::TOOLS
        .iter()
        .chain(source::TOOLS)
        .chain(chat::TOOLS)
        .chain(research::TOOLS)
        .chain(generate::TOOLS)
        .chain(artifacts::TOOLS)
        .chain(pipeline::TOOLS)
        .chain(auth::TOOLS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Debug, Deserialize)]
    struct WaitFixture {
        title: String,
        #[serde(flatten)]
        wait: WaitArgs,
    }

    impl Validator for WaitFixture {
        fn validate(&self) -> Result<(), String> {
            let mut errors = ValidationErrors::new();
            validation::validate_required(&self.title, "title", &mut errors);
            self.wait.validate_into(&mut errors);
            errors.into_result()
        }
    }

    #[test]
    fn test_parse_arguments_reports_missing_field() {
        let err = parse_arguments::<WaitFixture>(None).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("missing field `title`"));
    }

    #[test]
    fn test_parse_arguments_runs_validation() {
        let err = parse_arguments::<WaitFixture>(Some(serde_json::json!({
            "title": " ",
            "timeout_seconds": 0
        })))
        .unwrap_err();
        let text = err.into_result().text();
        assert!(text.starts_with("[InvalidArguments] Invalid arguments: 2 problem(s)"));
    }

    #[test]
    fn test_wait_args_override_default_schedule() {
        let fixture: WaitFixture = parse_arguments(Some(serde_json::json!({
            "title": "t",
            "poll_interval_seconds": 2
        })))
        .unwrap();
        let schedule = fixture.wait.schedule(ArtifactKind::Audio);
        assert_eq!(schedule.interval, Duration::from_secs(2));
        assert_eq!(schedule.max_wait, Duration::from_secs(600));
    }

    #[test]
    fn test_remote_error_text_has_kind_and_hint() {
        let err = ToolError::from(NotebookError::PollTimeout {
            task_id: "t-1".into(),
            waited: Duration::from_secs(300),
        });
        let result = err.into_result();
        assert!(result.is_error);
        let text = result.text();
        assert!(text.starts_with("[PollTimeout] job t-1 did not finish within 300s"));
        assert!(text.contains("list_artifacts"));
    }

    #[test]
    fn test_tool_names_are_unique() {
        let mut seen = HashSet::new();
        for tool in all_tools() {
            assert!(seen.insert(tool.name), "duplicate tool {}", tool.name);
        }
        assert_eq!(seen.len(), 35);
    }

    #[test]
    fn test_every_schema_is_an_object() {
        for tool in all_tools() {
            let schema = (tool.input_schema)();
            assert_eq!(schema["type"], "object", "{}", tool.name);
            assert!(schema["properties"].is_object(), "{}", tool.name);
        }
    }
}
