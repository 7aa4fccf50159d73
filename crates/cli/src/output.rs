use anyhow::Result;
use serde::Serialize;
use sessiontree_core::ClassificationResult;
use sessiontree_parsers::LineError;
use sessiontree_tree::{ConversationTree, NodeKey, NodeLink, TreeNode};

/// Output format for tree data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One classified block, as printed by `classify` and `follow`.
#[derive(Debug, Serialize)]
pub struct BlockRecord<'a> {
    pub key: NodeKey,
    pub label: &'a str,
    #[serde(flatten)]
    pub classification: &'a ClassificationResult,
}

impl<'a> BlockRecord<'a> {
    pub fn from_node(node: &'a TreeNode) -> Option<Self> {
        Some(Self {
            key: node.key,
            label: &node.label,
            classification: node.classification.as_ref()?,
        })
    }
}

/// One outline row: indent, key, label, then strategy and link markers.
pub fn outline_row(depth: usize, node: &TreeNode) -> String {
    let mut row = format!("{}{}  {}", "  ".repeat(depth), node.key, node.label);
    if let Some(classification) = &node.classification {
        row.push_str(&format!("  [{}]", classification.display_strategy.as_str()));
    }
    match &node.link {
        Some(NodeLink::AwaitingResult) => row.push_str("  (no result)"),
        Some(NodeLink::Orphaned(_)) => row.push_str("  (orphaned)"),
        _ => {}
    }
    row
}

/// Indented outline of the tree. With `visible_only`, collapsed subtrees
/// are left out the way a renderer would.
pub fn render_outline(tree: &ConversationTree, visible_only: bool) -> String {
    let rows: Vec<(usize, &TreeNode)> = if visible_only {
        tree.visible_rows()
    } else {
        tree.walk().collect()
    };
    let mut out = String::new();
    for (depth, node) in rows {
        out.push_str(&outline_row(depth, node));
        out.push('\n');
    }
    out
}

pub fn warn_line_errors(source: &str, errors: &[LineError]) {
    for error in errors {
        eprintln!("Warning: {source}: {error}");
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
