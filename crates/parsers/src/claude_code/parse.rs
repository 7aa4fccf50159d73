use super::transform::{content_blocks, text_block};
use crate::stream::ParseError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use sessiontree_core::{ContentBlock, Environment, Message, Role};

// ── Raw JSONL deserialization types ──────────────────────────────────────────

/// Line types the assistant CLI writes that never carry conversation content.
const NON_CONVERSATION_TYPES: &[&str] = &[
    "summary",
    "file-history-snapshot",
    "progress",
    "queue-operation",
];

/// Fields shared by `user`, `assistant` and `system` lines.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawConversationEntry {
    #[serde(default)]
    pub(crate) uuid: Option<String>,
    #[serde(default)]
    pub(crate) parent_uuid: Option<String>,
    #[serde(default)]
    pub(crate) session_id: Option<String>,
    #[serde(default)]
    pub(crate) timestamp: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<RawMessage>,
    /// `system` lines put their text here instead of under `message`.
    #[serde(default)]
    pub(crate) content: Option<String>,
    #[serde(default)]
    pub(crate) cwd: Option<String>,
    #[serde(default)]
    pub(crate) git_branch: Option<String>,
    #[serde(default)]
    pub(crate) version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMessage {
    #[allow(dead_code)]
    #[serde(default)]
    pub(crate) role: Option<String>,
    pub(crate) content: RawContent,
    #[serde(default)]
    pub(crate) model: Option<String>,
}

/// Message content is either a plain string or an array of content blocks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawContent {
    Text(String),
    Blocks(Vec<RawContentBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum RawContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "thinking")]
    Thinking {},
    #[serde(rename = "image")]
    Image {},
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: ToolResultContent,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Other,
}

/// tool_result content can be a string, array of blocks, or absent
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
pub(crate) enum ToolResultContent {
    Text(String),
    Blocks(Vec<ToolResultBlock>),
    #[default]
    Null,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum ToolResultBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

// ── Line decoding ───────────────────────────────────────────────────────────

/// Decode one raw line into an unlinked [`Message`].
///
/// Tool results come back with an orphaned link; the caller's linker
/// assigns the real verdict. Nothing here touches parser state, so a
/// failing line can be dropped without side effects.
pub(crate) fn decode_line(raw: &str) -> Result<Message, ParseError> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| ParseError::Malformed {
        reason: format!("invalid JSON: {e}"),
    })?;
    let Some(object) = value.as_object() else {
        return Err(ParseError::Malformed {
            reason: "line is not a JSON object".to_string(),
        });
    };
    let Some(entry_type) = object.get("type").and_then(Value::as_str) else {
        return Err(ParseError::Malformed {
            reason: "missing string `type` field".to_string(),
        });
    };

    let role = match entry_type {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        "system" => Role::System,
        other if NON_CONVERSATION_TYPES.contains(&other) => {
            return Err(unsupported(other, "not a conversation message"));
        }
        other => return Err(unsupported(other, "unknown line type")),
    };
    let entry_type = entry_type.to_string();

    let entry: RawConversationEntry = serde_json::from_value(value)
        .map_err(|e| unsupported(&entry_type, &format!("invalid entry: {e}")))?;

    let (blocks, model) = match (&entry.message, role) {
        (Some(message), _) => (content_blocks(&message.content), message.model.clone()),
        (None, Role::System) => match entry.content.as_deref() {
            Some(text) => (text_block(text).into_iter().collect(), None),
            None => return Err(unsupported(&entry_type, "system line has no content")),
        },
        (None, _) => return Err(unsupported(&entry_type, "missing `message` field")),
    };

    if blocks.is_empty() {
        return Err(unsupported(&entry_type, "no usable content blocks"));
    }

    Ok(into_message(entry, role, blocks, model))
}

fn into_message(
    entry: RawConversationEntry,
    role: Role,
    blocks: Vec<ContentBlock>,
    model: Option<String>,
) -> Message {
    let timestamp = entry.timestamp.as_deref().and_then(|ts| {
        parse_timestamp(ts)
            .inspect_err(|e| tracing::debug!("Ignoring timestamp on {}: {}", role.as_str(), e))
            .ok()
    });

    Message {
        uuid: entry.uuid,
        role,
        blocks,
        parent_id: entry.parent_uuid,
        session_id: entry.session_id,
        timestamp,
        environment: Environment {
            cwd: entry.cwd,
            git_branch: entry.git_branch,
            version: entry.version,
        },
        model,
    }
}

fn unsupported(entry_type: &str, reason: &str) -> ParseError {
    ParseError::UnsupportedShape {
        entry_type: entry_type.to_string(),
        reason: reason.to_string(),
    }
}

/// Timestamps are ISO 8601, e.g. "2026-02-06T04:46:17.839Z"; naive values are read as UTC.
pub fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|ndt| ndt.and_utc())
        })
}
