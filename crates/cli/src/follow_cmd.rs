use crate::output::{outline_row, BlockRecord, OutputFormat};
use anyhow::Result;
use clap::Args;
use sessiontree_parsers::{DataSource, TailSource};
use sessiontree_runtime_config::ViewerConfig;
use sessiontree_tree::{LiveSession, Placement, TreeBuilder};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct FollowArgs {
    /// Conversation log that is still being written.
    pub file: PathBuf,
    /// Poll interval in milliseconds (default from config).
    #[arg(long)]
    pub poll_ms: Option<u64>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Tail `file` and print every node the live tree appends or updates.
/// Runs until the process is interrupted. Only newline-terminated lines are
/// read, so a final line without a trailing newline is not shown; use
/// `sessiontree tree` for a finished log.
pub fn run(args: FollowArgs, config: &ViewerConfig) -> Result<()> {
    let interval = Duration::from_millis(args.poll_ms.unwrap_or(config.stream.poll_interval_ms));
    let mut source = TailSource::new(&args.file);
    let mut live = LiveSession::new(TreeBuilder::from_config(config));
    let mut reported = 0;

    tracing::info!("Following {} every {:?}", args.file.display(), interval);
    loop {
        let placements = live.drain(&mut source)?;
        for placement in &placements {
            print_placement(&live, placement, args.format)?;
        }
        for error in &live.errors()[reported..] {
            eprintln!("Warning: {}: {error}", source.name());
        }
        reported = live.errors().len();
        if source.is_exhausted() {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

fn print_placement(live: &LiveSession, placement: &Placement, format: OutputFormat) -> Result<()> {
    let touched = placement
        .appended
        .iter()
        .map(|key| ('+', *key))
        .chain(placement.updated.iter().map(|key| ('~', *key)));
    for (marker, key) in touched {
        let Some((depth, node)) = live.tree().walk().find(|(_, node)| node.key == key) else {
            continue;
        };
        match format {
            OutputFormat::Text => println!("{marker} {}", outline_row(depth, node)),
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "change": if marker == '+' { "appended" } else { "updated" },
                    "key": key,
                    "label": node.label,
                    "block": BlockRecord::from_node(node),
                });
                println!("{}", serde_json::to_string(&value)?);
            }
        }
    }
    Ok(())
}
