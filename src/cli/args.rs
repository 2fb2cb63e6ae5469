//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Mark font files as active in the registration store, keeping directory selection in sync
#[derive(Parser, Debug)]
#[command(name = "fontreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Font root for this invocation (default: configured font_root)
    #[arg(short = 'r', long, global = true, value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Config file to load instead of the global one
    #[arg(long, global = true, env = "FONTREG_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the font tree with registration state
    Tree {
        /// Expand leaf folders and list every font file
        #[arg(short, long)]
        all: bool,
    },

    /// Register fonts (files or whole directories)
    Check {
        /// Paths, absolute or relative to the font root
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,
    },

    /// Unregister fonts (files or whole directories)
    Uncheck {
        /// Paths, absolute or relative to the font root
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,
    },

    /// Pick a node interactively and flip its state
    Pick,

    /// Show registration counts
    Status,

    /// Show or change the font root
    Root {
        #[command(subcommand)]
        command: RootCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum RootCommands {
    /// Print the effective font root
    Show,

    /// Save a new font root and show its tree
    Set {
        /// Font directory
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init,

    /// Show config paths
    Path,

    /// Edit config file
    Edit,
}
