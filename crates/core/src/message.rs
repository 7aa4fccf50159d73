use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn in the conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
            Self::System => "System",
        }
    }
}

/// Environment facts stamped on each log line by the assistant CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// One parsed line of the conversation log. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub role: Role,
    pub blocks: Vec<ContentBlock>,
    /// Back-reference (by uuid) to the preceding message in the causal chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Message {
    /// First non-empty text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.blocks.iter().find_map(|block| match block {
            ContentBlock::Text { text } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.blocks.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => {
                Some((id.as_str(), name.as_str(), input))
            }
            _ => None,
        })
    }

    pub fn tool_result_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, ContentBlock::ToolResult { .. }))
            .count()
    }
}

/// A single piece of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
        link: ResultLink,
    },
}

impl ContentBlock {
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text { .. } => BlockKind::Text,
            Self::ToolUse { .. } => BlockKind::ToolInput,
            Self::ToolResult { .. } => BlockKind::ToolResult,
        }
    }
}

/// Declared kind of a block, as seen by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    #[default]
    Text,
    ToolInput,
    ToolResult,
}

/// Position of a block in the parser's accepted-message sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockRef {
    pub message: usize,
    pub block: usize,
}

impl BlockRef {
    pub fn new(message: usize, block: usize) -> Self {
        Self { message, block }
    }
}

/// Linkage verdict recorded on a tool result when it was parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResultLink {
    Resolved { call: BlockRef, tool_name: String },
    Orphaned(LinkError),
}

impl ResultLink {
    pub fn orphaned(tool_use_id: impl Into<String>) -> Self {
        Self::Orphaned(LinkError::Orphaned {
            tool_use_id: tool_use_id.into(),
        })
    }

    pub fn is_orphaned(&self) -> bool {
        matches!(self, Self::Orphaned(_))
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::Resolved { tool_name, .. } => Some(tool_name),
            Self::Orphaned(_) => None,
        }
    }
}

/// Non-fatal linkage problems. Surfaced as data, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkError {
    #[error("tool result `{tool_use_id}` has no matching tool call")]
    Orphaned { tool_use_id: String },
}

/// Pairing of a tool call with a result that answers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLink {
    pub tool_use_id: String,
    pub call: BlockRef,
    pub result: BlockRef,
    /// The result was seen before its call (truncated or reordered log).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reordered: bool,
}
