use super::parse::{RawContent, RawContentBlock, ToolResultBlock, ToolResultContent};
use serde_json::Value;
use sessiontree_core::{ContentBlock, ResultLink};

// ── Content transformation helpers ──────────────────────────────────────────

/// Convert raw message content into domain blocks, keeping source order.
pub(super) fn content_blocks(content: &RawContent) -> Vec<ContentBlock> {
    match content {
        RawContent::Text(text) => text_block(text).into_iter().collect(),
        RawContent::Blocks(blocks) => blocks.iter().filter_map(convert_block).collect(),
    }
}

/// A text block, or nothing for whitespace-only text.
pub(super) fn text_block(text: &str) -> Option<ContentBlock> {
    if text.trim().is_empty() {
        return None;
    }
    Some(ContentBlock::Text {
        text: text.to_string(),
    })
}

fn convert_block(block: &RawContentBlock) -> Option<ContentBlock> {
    match block {
        RawContentBlock::Text { text } => text_block(text),
        RawContentBlock::ToolUse { id, name, input } => Some(ContentBlock::ToolUse {
            id: id.clone().unwrap_or_default(),
            name: name.clone(),
            input: input.clone(),
        }),
        RawContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => Some(ContentBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: tool_result_content_to_string(content),
            is_error: *is_error,
            link: ResultLink::orphaned(tool_use_id.as_str()),
        }),
        RawContentBlock::Thinking {} => {
            tracing::debug!("Skipping thinking block");
            None
        }
        RawContentBlock::Image {} => {
            tracing::debug!("Skipping image block");
            None
        }
        RawContentBlock::Other => {
            tracing::debug!("Skipping unknown content block type");
            None
        }
    }
}

/// Extract raw text from ToolResult content
pub(super) fn tool_result_content_to_string(content: &ToolResultContent) -> String {
    match content {
        ToolResultContent::Text(text) => text.clone(),
        ToolResultContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ToolResultBlock::Text { text } => Some(text.as_str()),
                ToolResultBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ToolResultContent::Null => String::new(),
    }
}

// ── Tool call summaries ─────────────────────────────────────────────────────

/// One-line summary of a tool invocation for labels.
///
/// Well-known assistant tools are reduced to their most telling argument
/// (path, command, pattern, URL); anything else shows the tool name alone.
pub fn tool_use_summary(name: &str, input: &Value) -> String {
    let field = |key: &str| input.get(key).and_then(Value::as_str).unwrap_or("");
    let detail = match name {
        "Read" | "Write" | "Edit" | "MultiEdit" => field("file_path"),
        "NotebookEdit" => input
            .get("notebook_path")
            .or_else(|| input.get("file_path"))
            .and_then(Value::as_str)
            .unwrap_or(""),
        "Bash" => {
            let description = field("description");
            if description.is_empty() {
                field("command")
            } else {
                description
            }
        }
        "Glob" | "Grep" => field("pattern"),
        "WebSearch" => field("query"),
        "WebFetch" => field("url"),
        "Task" | "Agent" => field("description"),
        _ => "",
    };
    let detail = sessiontree_core::text::first_line(detail);
    if detail.is_empty() {
        name.to_string()
    } else {
        format!("{name}: {detail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_blocks_join_text_parts() {
        let content = ToolResultContent::Blocks(vec![
            ToolResultBlock::Text {
                text: "line 1".to_string(),
            },
            ToolResultBlock::Other,
            ToolResultBlock::Text {
                text: "line 2".to_string(),
            },
        ]);
        assert_eq!(tool_result_content_to_string(&content), "line 1\nline 2");
        assert_eq!(tool_result_content_to_string(&ToolResultContent::Null), "");
    }

    #[test]
    fn test_blank_text_is_dropped() {
        assert!(text_block("  \n ").is_none());
        assert!(text_block("hi").is_some());
    }

    #[test]
    fn test_tool_use_summary_read() {
        let input = serde_json::json!({"file_path": "/tmp/test.rs"});
        assert_eq!(tool_use_summary("Read", &input), "Read: /tmp/test.rs");
    }

    #[test]
    fn test_tool_use_summary_bash_prefers_description() {
        let input = serde_json::json!({"command": "ls -la", "description": "List files"});
        assert_eq!(tool_use_summary("Bash", &input), "Bash: List files");
        let bare = serde_json::json!({"command": "cargo fmt\ncargo test"});
        assert_eq!(tool_use_summary("Bash", &bare), "Bash: cargo fmt");
    }

    #[test]
    fn test_tool_use_summary_unknown_tool() {
        let input = serde_json::json!({"query": "x"});
        assert_eq!(
            tool_use_summary("mcp__search__find", &input),
            "mcp__search__find"
        );
        assert_eq!(
            tool_use_summary("Grep", &serde_json::json!({"pattern": "fn main"})),
            "Grep: fn main"
        );
    }
}
