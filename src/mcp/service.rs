//! MCP Service - Core JSON-RPC 2.0 request handler.
//!
//! Transport independent: stdio and HTTP both hand decoded requests to
//! [`McpService::handle_request`] and write back whatever it returns.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mcp::prompts::{self, PromptDescriptor};
use crate::mcp::resources::{self, ResourceDescriptor};
use crate::mcp::rpc::{OutboundResponse, RpcRequest, INVALID_REQUEST, NOT_FOUND};
use crate::mcp::tools::{ToolDescriptor, ToolRegistry};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Core MCP request handler.
#[derive(Clone)]
pub struct McpService {
    registry: Arc<ToolRegistry>,
}

impl McpService {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one request. Notifications produce no response.
    pub async fn handle_request(&self, request: RpcRequest) -> Option<OutboundResponse> {
        if request.jsonrpc != "2.0" {
            warn!("received unsupported jsonrpc version: {}", request.jsonrpc);
            return Some(OutboundResponse::error(
                request.id,
                INVALID_REQUEST,
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }

        if request.is_notification() {
            debug!("received client notification: {}", request.method);
            return None;
        }

        let RpcRequest {
            method, params, id, ..
        } = request;

        let response = match method.as_str() {
            "initialize" => self.handle_initialize(id, params),
            "ping" => OutboundResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, params).await,
            "prompts/list" => self.handle_prompts_list(id),
            "prompts/get" => self.handle_prompts_get(id, params),
            "resources/list" => self.handle_resources_list(id),
            "resources/read" => self.handle_resources_read(id, params).await,
            "resources/templates/list" => respond(
                id,
                ResourceTemplateListResult {
                    resource_templates: Vec::new(),
                },
            ),
            other => OutboundResponse::method_not_found(id, other),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>, params: Option<Value>) -> OutboundResponse {
        let parsed: InitializeParams = match parse_params(params) {
            Ok(value) => value,
            Err(message) => return OutboundResponse::invalid_params(id, message),
        };

        if let Some(client) = parsed.client_info {
            info!(
                "client requested initialization: {} v{} (protocol {})",
                client.name,
                client.version.unwrap_or_else(|| "unknown".into()),
                parsed.protocol_version.as_deref().unwrap_or("unspecified")
            );
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION,
            server_info: ImplementationInfo {
                name: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
                title: Some("NotebookLM MCP Server"),
            },
            capabilities: ServerCapabilities {
                tools: ListChanged::default(),
                prompts: ListChanged::default(),
                resources: ResourcesCapability::default(),
            },
            instructions: concat!(
                "Tools for Google NotebookLM: create notebooks, add sources, ask source-grounded ",
                "questions and generate reports, audio, video and more. Generation tools wait for ",
                "the job to finish; use download_artifact afterwards to fetch the file."
            ),
        };

        respond(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> OutboundResponse {
        respond(
            id,
            ListToolsResult {
                tools: self.registry.list_tools(),
                next_cursor: None,
            },
        )
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> OutboundResponse {
        let parsed: CallToolParams = match parse_params(params) {
            Ok(value) => value,
            Err(message) => return OutboundResponse::invalid_params(id, message),
        };

        let result = self.registry.call_tool(&parsed.name, parsed.arguments).await;
        respond(id, result)
    }

    fn handle_prompts_list(&self, id: Option<Value>) -> OutboundResponse {
        respond(
            id,
            PromptListResult {
                prompts: prompts::PROMPTS.iter().map(|p| p.descriptor()).collect(),
                next_cursor: None,
            },
        )
    }

    fn handle_prompts_get(&self, id: Option<Value>, params: Option<Value>) -> OutboundResponse {
        let parsed: PromptGetParams = match parse_params(params) {
            Ok(value) => value,
            Err(message) => return OutboundResponse::invalid_params(id, message),
        };

        let Some(prompt) = prompts::find(&parsed.name) else {
            return OutboundResponse::error(
                id,
                NOT_FOUND,
                format!("Prompt '{}' is not available.", parsed.name),
            );
        };

        match prompt.render(parsed.arguments) {
            Ok(text) => respond(
                id,
                json!({
                    "description": prompt.description,
                    "messages": [{
                        "role": "user",
                        "content": { "type": "text", "text": text }
                    }]
                }),
            ),
            Err(message) => OutboundResponse::invalid_params(id, message),
        }
    }

    fn handle_resources_list(&self, id: Option<Value>) -> OutboundResponse {
        respond(
            id,
            ListResourcesResult {
                resources: resources::RESOURCES,
                next_cursor: None,
            },
        )
    }

    async fn handle_resources_read(
        &self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> OutboundResponse {
        let parsed: ResourceReadParams = match parse_params(params) {
            Ok(value) => value,
            Err(message) => return OutboundResponse::invalid_params(id, message),
        };

        let client = self.registry.context().client.as_ref();
        match resources::read(client, &parsed.uri).await {
            Some(Ok(text)) => respond(
                id,
                json!({
                    "contents": [{
                        "uri": parsed.uri,
                        "mimeType": "text/plain",
                        "text": text
                    }]
                }),
            ),
            Some(Err(message)) => OutboundResponse::internal_error(id, message),
            None => OutboundResponse::error(
                id,
                NOT_FOUND,
                format!("Resource '{}' not found.", parsed.uri),
            ),
        }
    }
}

fn respond<T: Serialize>(id: Option<Value>, payload: T) -> OutboundResponse {
    match serde_json::to_value(payload) {
        Ok(value) => OutboundResponse::success(id, value),
        Err(err) => OutboundResponse::internal_error(id, format!("failed to encode result: {err}")),
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct InitializeParams {
    #[serde(rename = "protocolVersion", default)]
    protocol_version: Option<String>,
    #[serde(rename = "clientInfo", default)]
    client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
struct ClientInfo {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: &'static str,
    #[serde(rename = "serverInfo")]
    server_info: ImplementationInfo,
    capabilities: ServerCapabilities,
    instructions: &'static str,
}

#[derive(Debug, Serialize)]
struct ImplementationInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: ListChanged,
    prompts: ListChanged,
    resources: ResourcesCapability,
}

#[derive(Debug, Default, Serialize)]
struct ListChanged {
    #[serde(rename = "listChanged")]
    list_changed: bool,
}

#[derive(Debug, Default, Serialize)]
struct ResourcesCapability {
    subscribe: bool,
    #[serde(rename = "listChanged")]
    list_changed: bool,
}

#[derive(Debug, Serialize)]
struct ListToolsResult {
    tools: Vec<ToolDescriptor>,
    #[serde(rename = "nextCursor")]
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ListResourcesResult {
    resources: &'static [ResourceDescriptor],
    #[serde(rename = "nextCursor")]
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

#[derive(Debug, Serialize)]
struct ResourceTemplateListResult {
    #[serde(rename = "resourceTemplates")]
    resource_templates: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct PromptListResult {
    prompts: Vec<PromptDescriptor>,
    #[serde(rename = "nextCursor")]
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptGetParams {
    name: String,
    #[serde(default)]
    arguments: HashMap<String, String>,
}

/// Missing params are treated as an empty object.
fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    let value = match params {
        Some(Value::Null) | None => json!({}),
        Some(value) => value,
    };
    serde_json::from_value(value).map_err(|err| err.to_string())
}
