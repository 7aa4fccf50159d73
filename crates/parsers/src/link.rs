//! Tool call ↔ tool result linkage.

use serde::Serialize;
use serde_json::Value;
use sessiontree_core::{BlockRef, ContentBlock, Message, ResultLink, ToolLink};
use std::collections::HashMap;

/// A registered tool call and every result that answered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub tool_name: String,
    pub input: Value,
    pub site: BlockRef,
    pub resolved_by: Vec<BlockRef>,
}

/// Pairs tool results with the calls they answer, keyed by tool-call id.
#[derive(Debug, Default, Clone)]
pub struct ToolLinker {
    calls: HashMap<String, ToolCallRecord>,
    /// Results seen before any call with their id.
    pending: HashMap<String, Vec<BlockRef>>,
    links: Vec<ToolLink>,
}

impl ToolLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register calls and resolve results in block order for the message at `index`.
    pub fn link_message(&mut self, index: usize, message: &mut Message) {
        for (position, block) in message.blocks.iter_mut().enumerate() {
            let site = BlockRef::new(index, position);
            match block {
                ContentBlock::ToolUse { id, name, input } => {
                    self.register_call(id, name, input, site);
                }
                ContentBlock::ToolResult {
                    tool_use_id, link, ..
                } => {
                    *link = self.resolve_result(tool_use_id, site);
                }
                ContentBlock::Text { .. } => {}
            }
        }
    }

    fn register_call(&mut self, id: &str, name: &str, input: &Value, site: BlockRef) {
        if id.trim().is_empty() {
            return;
        }
        if self.calls.contains_key(id) {
            tracing::debug!("Duplicate tool call id {id}, keeping the first");
            return;
        }

        let mut record = ToolCallRecord {
            id: id.to_string(),
            tool_name: name.to_string(),
            input: input.clone(),
            site,
            resolved_by: Vec::new(),
        };
        for result in self.pending.remove(id).unwrap_or_default() {
            record.resolved_by.push(result);
            self.links.push(ToolLink {
                tool_use_id: id.to_string(),
                call: site,
                result,
                reordered: true,
            });
        }
        self.calls.insert(id.to_string(), record);
    }

    fn resolve_result(&mut self, tool_use_id: &str, site: BlockRef) -> ResultLink {
        match self.calls.get_mut(tool_use_id) {
            Some(record) => {
                record.resolved_by.push(site);
                self.links.push(ToolLink {
                    tool_use_id: tool_use_id.to_string(),
                    call: record.site,
                    result: site,
                    reordered: false,
                });
                ResultLink::Resolved {
                    call: record.site,
                    tool_name: record.tool_name.clone(),
                }
            }
            None => {
                if !tool_use_id.trim().is_empty() {
                    self.pending
                        .entry(tool_use_id.to_string())
                        .or_default()
                        .push(site);
                }
                ResultLink::orphaned(tool_use_id)
            }
        }
    }

    pub fn tool_call(&self, id: &str) -> Option<&ToolCallRecord> {
        self.calls.get(id)
    }

    /// Every link, ordered by call site then result site.
    pub fn links(&self) -> Vec<ToolLink> {
        let mut links = self.links.clone();
        links.sort_by_key(|link| (link.call, link.result));
        links
    }

    /// Calls no result has answered yet.
    pub fn unanswered(&self) -> Vec<&ToolCallRecord> {
        let mut calls: Vec<_> = self
            .calls
            .values()
            .filter(|record| record.resolved_by.is_empty())
            .collect();
        calls.sort_by_key(|record| record.site);
        calls
    }

    /// Ids of results still waiting for a call.
    pub fn pending_ids(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(String::as_str)
    }
}
