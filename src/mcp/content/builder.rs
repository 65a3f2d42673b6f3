//! Builder for tool responses.
//!
//! Most tools answer with a few labelled lines; the builder keeps that
//! formatting in one place.

use serde::Serialize;

use super::types::{ContentItem, EmbeddedResource, ToolResult};

#[derive(Debug, Default)]
pub struct ContentBuilder {
    lines: Vec<String>,
    items: Vec<ContentItem>,
    is_error: bool,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a heading line.
    pub fn heading(heading: impl Into<String>) -> Self {
        Self::new().line(heading)
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Indented `label: value` line.
    pub fn field(self, label: &str, value: impl std::fmt::Display) -> Self {
        self.line(format!("  {}: {}", label, value))
    }

    /// Field that is only written when present.
    pub fn field_opt<T: std::fmt::Display>(self, label: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.field(label, value),
            None => self,
        }
    }

    pub fn blank(self) -> Self {
        self.line(String::new())
    }

    /// Pretty-printed JSON block.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
        self.line(text)
    }

    pub fn resource(mut self, resource: EmbeddedResource) -> Self {
        self.flush_text();
        self.items.push(ContentItem::resource(resource));
        self
    }

    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }

    pub fn build(mut self) -> ToolResult {
        self.flush_text();
        ToolResult {
            content: self.items,
            is_error: self.is_error,
        }
    }

    fn flush_text(&mut self) {
        if !self.lines.is_empty() {
            let text = std::mem::take(&mut self.lines).join("\n");
            self.items.push(ContentItem::text(text));
        }
    }
}
