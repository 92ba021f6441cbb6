use super::*;
use mnemo_core::{SectionType, SystemClock, UlidGenerator};
use mnemo_store::{MemoryStore, StoreConfig};
use std::sync::Arc;
use tempfile::tempdir;

fn make_service(root: &std::path::Path) -> MemoryService {
    MemoryService::new(MemoryStore::new(
        StoreConfig::new(root),
        Arc::new(UlidGenerator),
        Arc::new(SystemClock),
    ))
}

// --- get_tools tests ---

#[test]
fn get_tools_returns_read_and_capture() {
    let names: Vec<String> = get_tools().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec![READ_TOOL, CAPTURE_TOOL]);
}

#[test]
fn get_tools_all_have_descriptions_and_schemas() {
    for tool in get_tools() {
        assert!(!tool.description.is_empty(), "{}", tool.name);
        assert!(tool.input_schema.is_object(), "{}", tool.name);
    }
}

#[test]
fn capture_schema_requires_tag_and_content() {
    let tools = get_tools();
    let capture = tools.iter().find(|t| t.name == CAPTURE_TOOL).unwrap();
    assert_eq!(capture.input_schema["required"], json!(["tag", "content"]));
    let serialized = serde_json::to_value(capture).unwrap();
    assert!(serialized.get("inputSchema").is_some());
}

// --- call_tool tests ---

#[test]
fn read_on_fresh_project_is_empty_text() {
    let dir = tempdir().unwrap();
    let service = make_service(dir.path());

    let result = call_tool(&service, &CancelToken::new(), READ_TOOL, &json!({}));
    assert_eq!(result, ToolResult::text(""));
}

#[test]
fn capture_then_read() {
    let dir = tempdir().unwrap();
    let service = make_service(dir.path());
    let ctx = CancelToken::new();

    let result = call_tool(
        &service,
        &ctx,
        CAPTURE_TOOL,
        &json!({
            "category": "decisions",
            "tag": "DB",
            "content": "Use Postgres",
            "rationale": "Team knows it"
        }),
    );
    assert!(!result.is_error, "{}", result.text);
    assert!(result.text.starts_with("Successfully captured entry to 'decisions' category"));

    let read = call_tool(&service, &ctx, READ_TOOL, &Value::Null);
    assert!(!read.is_error);
    assert!(read.text.contains("* **[DB]** Use Postgres (*Rationale: Team knows it*)"));

    let section = service.read_section(SectionType::Decisions).unwrap();
    assert_eq!(section.entries.len(), 1);
}

#[test]
fn capture_without_category_is_a_note() {
    let dir = tempdir().unwrap();
    let service = make_service(dir.path());

    let result = call_tool(
        &service,
        &CancelToken::new(),
        CAPTURE_TOOL,
        &json!({ "tag": "Misc", "content": "Remember this" }),
    );
    assert!(!result.is_error, "{}", result.text);
    assert!(result.text.contains("'note' category"));
}

#[test]
fn capture_validation_failure_is_error_result() {
    let dir = tempdir().unwrap();
    let service = make_service(dir.path());

    let result = call_tool(
        &service,
        &CancelToken::new(),
        CAPTURE_TOOL,
        &json!({ "category": "patterns", "tag": "X", "content": "has <html>" }),
    );
    assert!(result.is_error);
    assert!(result.text.starts_with("Validation failed: forbidden content"));

    let result = call_tool(&service, &CancelToken::new(), CAPTURE_TOOL, &json!({}));
    assert!(result.is_error);
    assert!(result.text.contains("tag cannot be empty"));
}

#[test]
fn cancelled_capture_is_error_result() {
    let dir = tempdir().unwrap();
    let service = make_service(dir.path());
    let ctx = CancelToken::new();
    ctx.cancel();

    let result = call_tool(
        &service,
        &ctx,
        CAPTURE_TOOL,
        &json!({ "category": "patterns", "tag": "X", "content": "fine" }),
    );
    assert!(result.is_error);
    assert!(result.text.starts_with("Failed to capture to memory: lock acquisition cancelled"));
}

#[test]
fn unknown_tool_is_error_result() {
    let dir = tempdir().unwrap();
    let service = make_service(dir.path());

    let result = call_tool(&service, &CancelToken::new(), "mnemo_delete", &json!({}));
    assert!(result.is_error);
    assert_eq!(result.text, "Unknown tool: mnemo_delete");
}
