//! Node labels: one short line per node.

use serde_json::Value;
use sessiontree_core::text::{first_line, strip_system_reminders, truncate_chars};
use sessiontree_core::{ContentBlock, Message};
use sessiontree_parsers::claude_code::tool_use_summary;

pub(crate) fn message_label(message: &Message, max_chars: usize) -> String {
    let role = message.role.display();
    let summary = match message.first_text() {
        Some(text) => first_line(&strip_system_reminders(text)).to_string(),
        None => match message.tool_uses().next() {
            Some((_, name, input)) => tool_use_summary(name, input),
            None => results_summary(message),
        },
    };
    if summary.is_empty() {
        return truncate_chars(role, max_chars);
    }
    truncate_chars(&format!("{role}: {summary}"), max_chars)
}

fn results_summary(message: &Message) -> String {
    match message.tool_result_count() {
        0 => String::new(),
        1 => "1 tool result".to_string(),
        n => format!("{n} tool results"),
    }
}

pub(crate) fn text_label(text: &str, max_chars: usize) -> String {
    truncate_chars(first_line(text), max_chars)
}

pub(crate) fn call_label(name: &str, input: &Value, max_chars: usize) -> String {
    truncate_chars(&tool_use_summary(name, input), max_chars)
}

pub(crate) fn result_label(tool_name: Option<&str>, block: &ContentBlock, max_chars: usize) -> String {
    let ContentBlock::ToolResult {
        tool_use_id,
        content,
        is_error,
        ..
    } = block
    else {
        return String::new();
    };
    let head = match (tool_name, *is_error) {
        (Some(name), false) => format!("{name} result"),
        (Some(name), true) => format!("{name} error"),
        (None, false) => format!("Orphaned result {tool_use_id}"),
        (None, true) => format!("Orphaned error {tool_use_id}"),
    };
    let line = first_line(content);
    let label = if line.is_empty() {
        format!("{head} (empty)")
    } else {
        format!("{head}: {line}")
    };
    truncate_chars(&label, max_chars)
}
