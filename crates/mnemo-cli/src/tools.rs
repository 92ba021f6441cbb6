//! Agent-facing tools over the memory service: descriptors plus dispatch.
//! Failures come back as error results, never as `Err`.

use mnemo_core::{AppendInput, MemoryError};
use mnemo_store::{CancelToken, MemoryService};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

pub const READ_TOOL: &str = "mnemo_read";
pub const CAPTURE_TOOL: &str = "mnemo_capture";

/// Tool descriptor in the shape agent hosts expect.
#[derive(Debug, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub text: String,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

pub fn get_tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: READ_TOOL.to_string(),
            description: "Read the working memory file (.mnemo/memory.md). Returns the raw \
                          Markdown with constraints, decisions, patterns and anti-patterns."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDef {
            name: CAPTURE_TOOL.to_string(),
            description: "Capture a new entry to the working memory file under a category."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "enum": ["constraints", "decisions", "patterns", "anti-patterns", "note"],
                        "description": "Category; defaults to 'note' (stored under Decisions)"
                    },
                    "tag": {
                        "type": "string",
                        "description": "Tag for the entry (max 50 chars, wrapped in brackets)"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to remember (max 2000 chars, single line, no markup)"
                    },
                    "rationale": {
                        "type": "string",
                        "description": "Optional reason (max 500 chars)"
                    }
                },
                "required": ["tag", "content"]
            }),
        },
    ]
}

pub fn call_tool(
    service: &MemoryService,
    ctx: &CancelToken,
    name: &str,
    arguments: &Value,
) -> ToolResult {
    debug!(tool = name, "tool call");
    match name {
        READ_TOOL => read_tool(service),
        CAPTURE_TOOL => capture_tool(service, ctx, arguments),
        _ => ToolResult::error(format!("Unknown tool: {name}")),
    }
}

fn read_tool(service: &MemoryService) -> ToolResult {
    match service.read_memory() {
        Ok(content) => ToolResult::text(content),
        Err(e) => {
            error!(error = %e, "failed to read memory");
            ToolResult::error(format!("Failed to read memory: {e}"))
        }
    }
}

fn capture_tool(service: &MemoryService, ctx: &CancelToken, arguments: &Value) -> ToolResult {
    let input = AppendInput {
        category: string_arg(arguments, "category"),
        tag: string_arg(arguments, "tag"),
        content: string_arg(arguments, "content"),
        rationale: string_arg(arguments, "rationale"),
    };

    match service.capture(ctx, &input) {
        Ok(receipt) => ToolResult::text(format!(
            "Successfully captured entry to '{}' category (id {}).",
            receipt.section, receipt.id
        )),
        Err(MemoryError::Validation(e)) => {
            warn!(error = %e, category = %input.category, tag = %input.tag, "validation failed");
            ToolResult::error(format!("Validation failed: {e}"))
        }
        Err(e) => {
            error!(error = %e, "failed to capture memory");
            ToolResult::error(format!("Failed to capture to memory: {e}"))
        }
    }
}

/// Missing or non-string arguments read as empty.
fn string_arg(arguments: &Value, key: &str) -> String {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
