//! Decoder for the assistant CLI's JSONL conversation log.
//!
//! Each line is one JSON object; `user`, `assistant` and `system` lines
//! become [`sessiontree_core::Message`]s, everything else is reported as an
//! unsupported shape.

mod parse;
mod transform;

pub(crate) use parse::decode_line;
pub use parse::parse_timestamp;
pub use transform::tool_use_summary;

/// Subagent transcripts live next to the parent log and are not part of it.
pub fn is_subagent_path(path: &std::path::Path) -> bool {
    let path_text = path.to_string_lossy();
    if path_text.contains("/subagents/") || path_text.contains("\\subagents\\") {
        return true;
    }

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_ascii_lowercase();
    lower.starts_with("agent-")
        || lower.starts_with("agent_")
        || lower.starts_with("subagent-")
        || lower.starts_with("subagent_")
}
