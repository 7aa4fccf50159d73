use crate::output::{print_json, render_outline, warn_line_errors, OutputFormat};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sessiontree_core::get_session_info;
use sessiontree_parsers::{parse_file, LineError};
use sessiontree_runtime_config::ViewerConfig;
use sessiontree_tree::{ConversationTree, TreeBuilder};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Args)]
pub struct TreeArgs {
    /// Conversation log (JSONL).
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Leave out children of collapsed nodes.
    #[arg(long)]
    pub visible: bool,
}

#[derive(Serialize)]
struct TreeOutput<'a> {
    tree: &'a ConversationTree,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parse_errors: Vec<LineError>,
}

/// Parse a whole log and build its tree.
pub fn load_tree(file: &Path, config: &ViewerConfig) -> Result<(ConversationTree, Vec<LineError>)> {
    let batch = parse_file(file)?;
    let info = get_session_info(&batch.messages);
    let tree = TreeBuilder::from_config(config).build_tree(&batch.messages, &info);
    Ok((tree, batch.errors))
}

pub fn run(args: TreeArgs, config: &ViewerConfig) -> Result<()> {
    let (tree, errors) = load_tree(&args.file, config)?;
    match args.format {
        OutputFormat::Text => {
            warn_line_errors(&args.file.display().to_string(), &errors);
            print!("{}", render_outline(&tree, args.visible));
            Ok(())
        }
        OutputFormat::Json => print_json(&TreeOutput {
            tree: &tree,
            parse_errors: errors,
        }),
    }
}
