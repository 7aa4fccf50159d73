//! Message builders for tests in downstream crates.

use crate::message::{BlockRef, ContentBlock, Environment, Message, ResultLink, Role};

/// Message with the given role and blocks, no metadata.
pub fn message(role: Role, blocks: Vec<ContentBlock>) -> Message {
    Message {
        uuid: Some(format!("test-{}", next_id())),
        role,
        blocks,
        parent_id: None,
        session_id: Some("test-session".to_string()),
        timestamp: None,
        environment: Environment::default(),
        model: None,
    }
}

/// Single text block message.
pub fn text(role: Role, text: &str) -> Message {
    message(role, vec![text_block(text)])
}

pub fn text_block(text: &str) -> ContentBlock {
    ContentBlock::Text {
        text: text.to_string(),
    }
}

pub fn tool_use_block(id: &str, name: &str, input: serde_json::Value) -> ContentBlock {
    ContentBlock::ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        input,
    }
}

/// Tool result block with an orphaned parser verdict; the tree relinks on its own.
pub fn tool_result_block(tool_use_id: &str, content: &str, is_error: bool) -> ContentBlock {
    ContentBlock::ToolResult {
        tool_use_id: tool_use_id.to_string(),
        content: content.to_string(),
        is_error,
        link: ResultLink::orphaned(tool_use_id),
    }
}

/// Tool result block already resolved to `call`.
pub fn linked_result_block(
    tool_use_id: &str,
    tool_name: &str,
    call: BlockRef,
    content: &str,
) -> ContentBlock {
    ContentBlock::ToolResult {
        tool_use_id: tool_use_id.to_string(),
        content: content.to_string(),
        is_error: false,
        link: ResultLink::Resolved {
            call,
            tool_name: tool_name.to_string(),
        },
    }
}

/// Assistant turn with a single tool call.
pub fn tool_call(id: &str, name: &str, input: serde_json::Value) -> Message {
    message(Role::Assistant, vec![tool_use_block(id, name, input)])
}

/// User turn carrying a single tool result.
pub fn tool_result(tool_use_id: &str, content: &str, is_error: bool) -> Message {
    message(
        Role::User,
        vec![tool_result_block(tool_use_id, content, is_error)],
    )
}

fn next_id() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
