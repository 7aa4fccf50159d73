use crate::output::{print_json, warn_line_errors, BlockRecord};
use crate::tree_cmd::load_tree;
use anyhow::Result;
use serde::Serialize;
use sessiontree_core::SessionInfo;
use sessiontree_parsers::claude_code::is_subagent_path;
use sessiontree_runtime_config::ViewerConfig;
use std::path::Path;

#[derive(Serialize)]
struct InfoOutput<'a> {
    path: String,
    subagent: bool,
    #[serde(flatten)]
    info: &'a SessionInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<u64>,
    parse_errors: usize,
    skipped_messages: usize,
}

pub fn run_info(file: &Path, config: &ViewerConfig) -> Result<()> {
    let (tree, errors) = load_tree(file, config)?;
    let info = tree.info();
    print_json(&InfoOutput {
        path: file.display().to_string(),
        subagent: is_subagent_path(file),
        info,
        duration_seconds: info.duration_seconds(),
        parse_errors: errors.len(),
        skipped_messages: tree.diagnostics().len(),
    })
}

/// One JSON object per classified block, in conversation order.
pub fn run_classify(file: &Path, config: &ViewerConfig) -> Result<()> {
    let (tree, errors) = load_tree(file, config)?;
    warn_line_errors(&file.display().to_string(), &errors);

    let mut records: Vec<BlockRecord> = tree
        .walk()
        .filter_map(|(_, node)| BlockRecord::from_node(node))
        .collect();
    records.sort_by_key(|record| record.key);
    for record in records {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
