use crate::label::{call_label, message_label, result_label, text_label};
use crate::node::{
    CallSite, ConversationTree, NodeKey, NodeKind, NodeLink, TreeDiagnostic, TreeNode,
};
use serde::Serialize;
use sessiontree_classify::{ClassificationContext, ContentClassifier};
use sessiontree_core::validate::{validate_message, ValidationError};
use sessiontree_core::{
    get_session_info, BlockKind, ClassificationResult, ContentBlock, LinkError, Message,
    SessionInfo,
};
use sessiontree_runtime_config::{TreeSettings, ViewerConfig};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Keys touched by one incremental placement, for partial re-render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub appended: Vec<NodeKey>,
    pub updated: Vec<NodeKey>,
}

impl Placement {
    pub fn is_empty(&self) -> bool {
        self.appended.is_empty() && self.updated.is_empty()
    }

    fn mark_updated(&mut self, key: NodeKey) {
        if !self.updated.contains(&key) {
            self.updated.push(key);
        }
    }
}

/// Turns a message sequence into a [`ConversationTree`].
///
/// Batch and incremental placement share one code path, so folding
/// [`TreeBuilder::add_message`] over messages yields the same tree as
/// [`TreeBuilder::build_tree`].
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    classifier: ContentClassifier,
    settings: TreeSettings,
}

impl TreeBuilder {
    pub fn new(classifier: ContentClassifier, settings: TreeSettings) -> Self {
        Self {
            classifier,
            settings,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(
            ContentClassifier::new(config.classifier.clone()),
            config.tree.clone(),
        )
    }

    pub fn classifier(&self) -> &ContentClassifier {
        &self.classifier
    }

    /// Build the whole tree. Call sites are collected up front so placement
    /// never depends on how calls and results interleave.
    pub fn build_tree(&self, messages: &[Message], info: &SessionInfo) -> ConversationTree {
        let mut tree = ConversationTree::new(info.clone());
        let verdicts: Vec<Result<(), Vec<ValidationError>>> =
            messages.iter().map(validate_message).collect();

        let mut calls = HashMap::new();
        for (index, (message, verdict)) in messages.iter().zip(&verdicts).enumerate() {
            if verdict.is_ok() {
                register_calls(&mut calls, index, message);
            }
        }

        for (index, (message, verdict)) in messages.iter().zip(verdicts).enumerate() {
            match verdict {
                Ok(()) => {
                    self.place(&mut tree.root, &calls, index, message);
                }
                Err(errors) => record_skipped(&mut tree.diagnostics, index, errors),
            }
        }

        tree.calls = calls;
        tree.next_index = messages.len();
        tree
    }

    /// Place one more message, appending its subtree and updating the call
    /// nodes its results answer.
    pub fn add_message(&self, tree: &mut ConversationTree, message: &Message) -> Placement {
        let index = tree.next_index;
        tree.next_index += 1;
        tree.info.observe(message);

        let mut placement = match validate_message(message) {
            Ok(()) => {
                register_calls(&mut tree.calls, index, message);
                self.place(&mut tree.root, &tree.calls, index, message)
            }
            Err(errors) => {
                record_skipped(&mut tree.diagnostics, index, errors);
                Placement::default()
            }
        };

        if tree.relabel_root() {
            placement.mark_updated(NodeKey::Session);
        }
        placement
    }

    /// Rebuild from scratch, keeping the expanded flags of surviving keys.
    pub fn rebuild(&self, previous: &ConversationTree, messages: &[Message]) -> ConversationTree {
        let flags: HashMap<NodeKey, bool> = previous
            .walk()
            .map(|(_, node)| (node.key, node.expanded))
            .collect();
        let mut tree = self.build_tree(messages, &get_session_info(messages));
        tree.apply_expanded(&flags);
        tree
    }

    fn place(
        &self,
        root: &mut TreeNode,
        calls: &HashMap<String, CallSite>,
        index: usize,
        message: &Message,
    ) -> Placement {
        let max = self.settings.label_max_chars;
        let message_key = NodeKey::Message(index);
        let mut placement = Placement {
            appended: vec![message_key],
            updated: Vec::new(),
        };
        let mut message_node = TreeNode::structural(
            message_key,
            message_label(message, max),
            NodeKind::Message,
            self.settings.expand_messages,
        );
        let mut orphans = Vec::new();

        for (position, block) in message.blocks.iter().enumerate() {
            let key = NodeKey::block(index, position);
            match block {
                ContentBlock::Text { text } => {
                    let ctx = ClassificationContext::new(BlockKind::Text);
                    message_node.children.push(TreeNode {
                        classification: Some(self.classify(key, block, &ctx)),
                        ..TreeNode::structural(key, text_label(text, max), NodeKind::TextLeaf, false)
                    });
                }
                ContentBlock::ToolUse { name, input, .. } => {
                    let ctx = ClassificationContext::new(BlockKind::ToolInput);
                    message_node.children.push(TreeNode {
                        classification: Some(self.classify(key, block, &ctx)),
                        link: Some(NodeLink::AwaitingResult),
                        ..TreeNode::structural(
                            key,
                            call_label(name, input, max),
                            NodeKind::ToolCall,
                            self.settings.expand_tool_calls,
                        )
                    });
                }
                ContentBlock::ToolResult { tool_use_id, .. } => {
                    let site = calls
                        .get(tool_use_id.as_str())
                        .filter(|site| site.key < key);
                    let Some(site) = site else {
                        orphans.push(self.orphan_node(key, block, tool_use_id));
                        continue;
                    };

                    let ctx = ClassificationContext::new(BlockKind::ToolResult)
                        .with_tool(&site.tool_name, Some(&site.input));
                    let node = TreeNode {
                        classification: Some(self.classify(key, block, &ctx)),
                        link: Some(NodeLink::ResultOf { call: site.key }),
                        ..TreeNode::structural(
                            key,
                            result_label(Some(&site.tool_name), block, max),
                            NodeKind::ToolResult,
                            false,
                        )
                    };

                    let in_this_message = site.key.message() == Some(index);
                    let call_node = if in_this_message {
                        message_node.find_mut(site.key)
                    } else {
                        message_subtree(root, site.key).and_then(|node| node.find_mut(site.key))
                    };
                    match call_node {
                        Some(call_node) => {
                            call_node.children.push(node);
                            call_node.link = Some(NodeLink::Answered);
                            if !in_this_message {
                                placement.appended.push(key);
                                placement.mark_updated(site.key);
                            }
                        }
                        None => {
                            tracing::warn!("Call node {} missing, placing {} at root", site.key, key);
                            orphans.push(self.orphan_node(key, block, tool_use_id));
                        }
                    }
                }
            }
        }

        root.children.push(message_node);
        for orphan in orphans {
            placement.appended.push(orphan.key);
            root.children.push(orphan);
        }
        placement
    }

    fn orphan_node(&self, key: NodeKey, block: &ContentBlock, tool_use_id: &str) -> TreeNode {
        let ctx = ClassificationContext::new(BlockKind::ToolResult);
        TreeNode {
            classification: Some(self.classify(key, block, &ctx)),
            link: Some(NodeLink::Orphaned(LinkError::Orphaned {
                tool_use_id: tool_use_id.to_string(),
            })),
            ..TreeNode::structural(
                key,
                result_label(None, block, self.settings.label_max_chars),
                NodeKind::ToolResult,
                false,
            )
        }
    }

    /// Classification is never cut short; overruns are only reported.
    fn classify(
        &self,
        key: NodeKey,
        block: &ContentBlock,
        ctx: &ClassificationContext,
    ) -> ClassificationResult {
        let started = Instant::now();
        let result = self.classifier.classify(block, ctx);
        let elapsed = started.elapsed();
        let budget = Duration::from_millis(self.classifier.settings().classification_budget_ms);
        if elapsed > budget {
            tracing::warn!(
                "Classifying {} took {}ms (budget {}ms)",
                key,
                elapsed.as_millis(),
                budget.as_millis()
            );
        }
        result
    }
}

/// Top-level message node owning `key`. Root children stay sorted by key
/// because placement only ever appends.
fn message_subtree(root: &mut TreeNode, key: NodeKey) -> Option<&mut TreeNode> {
    let message = NodeKey::Message(key.message()?);
    let index = root
        .children
        .binary_search_by_key(&message, |child| child.key)
        .ok()?;
    root.children.get_mut(index)
}

/// Record the first call site per tool id (first seen wins).
fn register_calls(calls: &mut HashMap<String, CallSite>, index: usize, message: &Message) {
    for (position, block) in message.blocks.iter().enumerate() {
        if let ContentBlock::ToolUse { id, name, input } = block {
            calls.entry(id.clone()).or_insert_with(|| CallSite {
                key: NodeKey::block(index, position),
                tool_name: name.clone(),
                input: input.clone(),
            });
        }
    }
}

fn record_skipped(
    diagnostics: &mut Vec<TreeDiagnostic>,
    message_index: usize,
    errors: Vec<ValidationError>,
) {
    for error in errors {
        tracing::warn!("Skipping message {}: {}", message_index, error);
        diagnostics.push(TreeDiagnostic {
            message_index,
            error,
        });
    }
}
