mod config;
mod follow_cmd;
mod inspect;
mod output;
mod tree_cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sessiontree",
    about = "Browse assistant conversation logs as a tree of messages and tool calls"
)]
struct Cli {
    /// Config file (default: $SESSIONTREE_CONFIG or ~/.config/sessiontree/sessiontree.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the conversation tree of a log file
    Tree(tree_cmd::TreeArgs),

    /// Print session metadata as JSON
    Info {
        /// Conversation log (JSONL)
        file: PathBuf,
    },

    /// Print the display classification of every content block
    Classify {
        /// Conversation log (JSONL)
        file: PathBuf,
    },

    /// Follow a log that is still being written
    ///
    /// Lines appear once they end with a newline; an unterminated last line
    /// stays hidden until the writer finishes it.
    Follow(follow_cmd::FollowArgs),

    /// Show the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let explicit = cli.config.as_deref();
    let load = || config::load_config(explicit).map(|(config, _)| config);
    match cli.command {
        Commands::Tree(args) => tree_cmd::run(args, &load()?),
        Commands::Info { file } => inspect::run_info(&file, &load()?),
        Commands::Classify { file } => inspect::run_classify(&file, &load()?),
        Commands::Follow(args) => follow_cmd::run(args, &load()?),
        Commands::Config => config::show_config(explicit),
    }
}
