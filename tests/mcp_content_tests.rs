use notebooklm_mcp_server::mcp::content::{ContentBuilder, ContentItem, EmbeddedResource, ToolResult};

#[test]
fn test_builder_joins_lines_into_one_text_item() {
    let result = ContentBuilder::heading("Notebook created successfully.")
        .field("ID", "nb-1")
        .field_opt("Created", None::<&str>)
        .blank()
        .line("Use this notebook_id for subsequent operations.")
        .build();

    assert!(!result.is_error);
    assert_eq!(result.content.len(), 1);
    assert_eq!(
        result.text(),
        "Notebook created successfully.\n  ID: nb-1\n\nUse this notebook_id for subsequent operations."
    );
}

#[test]
fn test_builder_resource_splits_text() {
    let result = ContentBuilder::heading("Artifact downloaded successfully.")
        .resource(EmbeddedResource::blob("file:///tmp/a.png", "image/png", b"png"))
        .line("trailing")
        .build();

    assert_eq!(result.content.len(), 3);
    assert!(matches!(result.content[1], ContentItem::Resource { .. }));
}

#[test]
fn test_builder_error() {
    let result = ContentBuilder::heading("Failed to delete notebook nb-1.")
        .error()
        .build();
    assert!(result.is_error);
}

#[test]
fn test_tool_result_wire_shape() {
    let value = serde_json::to_value(ToolResult::error("[RateLimited] slow down")).unwrap();
    assert_eq!(value["isError"], true);
    assert_eq!(value["content"][0]["type"], "text");
    assert_eq!(value["content"][0]["text"], "[RateLimited] slow down");
}

#[test]
fn test_blob_round_trip() {
    let resource = EmbeddedResource::blob("file:///tmp/a.bin", "application/octet-stream", &[0, 255]);
    assert_eq!(resource.decode_blob().unwrap().unwrap(), vec![0, 255]);
}
