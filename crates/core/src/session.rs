//! Session-level metadata derived by folding over parsed messages.

use crate::message::{ContentBlock, Message, Role};
use crate::text::{
    is_continuation_preamble, set_first_non_empty, strip_system_reminders, truncate_chars,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 80;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// First real user prompt, truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Every distinct working directory, in first-seen order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_cwds: Vec<String>,
    pub message_count: usize,
    pub tool_call_count: usize,
    pub tool_result_count: usize,
}

impl SessionInfo {
    /// Fold one more message into the aggregate.
    pub fn observe(&mut self, message: &Message) {
        set_first_non_empty(&mut self.session_id, message.session_id.as_deref());
        set_first_non_empty(&mut self.cwd, message.environment.cwd.as_deref());
        set_first_non_empty(&mut self.git_branch, message.environment.git_branch.as_deref());
        set_first_non_empty(&mut self.version, message.environment.version.as_deref());
        set_first_non_empty(&mut self.model, message.model.as_deref());

        if let Some(cwd) = message.environment.cwd.as_deref().map(str::trim) {
            if !cwd.is_empty() && !self.all_cwds.iter().any(|c| c == cwd) {
                self.all_cwds.push(cwd.to_string());
            }
        }

        if self.title.is_none() && message.role == Role::User {
            self.title = message.blocks.iter().find_map(|block| match block {
                ContentBlock::Text { text } => title_candidate(text),
                _ => None,
            });
        }

        if let Some(ts) = message.timestamp {
            self.started_at = Some(self.started_at.map_or(ts, |current| current.min(ts)));
            self.ended_at = Some(self.ended_at.map_or(ts, |current| current.max(ts)));
        }

        self.message_count += 1;
        for block in &message.blocks {
            match block {
                ContentBlock::ToolUse { .. } => self.tool_call_count += 1,
                ContentBlock::ToolResult { .. } => self.tool_result_count += 1,
                ContentBlock::Text { .. } => {}
            }
        }
    }

    pub fn duration_seconds(&self) -> Option<u64> {
        let (start, end) = (self.started_at?, self.ended_at?);
        Some((end - start).num_seconds().max(0) as u64)
    }

    /// Human-readable root label, e.g. `Fix the build · /repo (main) · 1a2b3c4d`.
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        parts.push(self.title.clone().unwrap_or_else(|| "Session".to_string()));
        match (&self.cwd, &self.git_branch) {
            (Some(cwd), Some(branch)) => parts.push(format!("{cwd} ({branch})")),
            (Some(cwd), None) => parts.push(cwd.clone()),
            (None, Some(branch)) => parts.push(format!("({branch})")),
            (None, None) => {}
        }
        if let Some(id) = &self.session_id {
            parts.push(id.chars().take(8).collect());
        }
        parts.join(" · ")
    }
}

fn title_candidate(text: &str) -> Option<String> {
    let cleaned = strip_system_reminders(text);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || is_continuation_preamble(trimmed) {
        return None;
    }
    let single_line = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(truncate_chars(&single_line, TITLE_MAX_CHARS))
}

/// Derive session metadata from the full message sequence.
///
/// Ties are resolved by first-seen order, not by recency.
pub fn get_session_info(messages: &[Message]) -> SessionInfo {
    let mut info = SessionInfo::default();
    for message in messages {
        info.observe(message);
    }
    info
}
