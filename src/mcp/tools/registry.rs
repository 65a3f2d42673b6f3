//! Tool registry - central routing for MCP tools.
//!
//! Provides `list_tools()` and `call_tool()` as MCP defines them. Lookup by name is
//! the only string dispatch in the server.

use std::collections::HashMap;

use serde_json::Value;

use super::{all_tools, ToolContext, ToolDescriptor, ToolSpec};
use crate::mcp::content::ToolResult;

/// Central registry for all MCP tools.
pub struct ToolRegistry {
    context: ToolContext,
    tools: Vec<&'static ToolSpec>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new(context: ToolContext) -> Self {
        let tools: Vec<&'static ToolSpec> = all_tools().collect();
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, tool)| (tool.name, i))
            .collect();
        Self {
            context,
            tools,
            index,
        }
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// List all available tools as MCP defines them.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|tool| tool.descriptor()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&'static ToolSpec> {
        self.index.get(name).map(|&i| self.tools[i])
    }

    /// Call a tool by name. Failures come back as `isError` results, never
    /// as protocol errors.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return ToolResult::error(format!(
                "Tool '{}' is not available. Use tools/list to see the {} registered tools.",
                name,
                self.tools.len()
            ));
        };

        log::info!("calling tool {}", tool.name);
        match (tool.handler)(&self.context, arguments).await {
            Ok(result) => result,
            Err(err) => {
                log::warn!("tool {} failed: [{}] {}", tool.name, err.kind(), err);
                err.into_result()
            }
        }
    }
}
