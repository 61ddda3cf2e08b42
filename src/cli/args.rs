//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::DiameterMethod;

/// Neuron reconstruction analysis: tree diameter, longest path, morphometry
#[derive(Parser, Debug)]
#[command(name = "arborist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory holding .arborist.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Root-to-tip diameter of a reconstruction
    Diameter {
        /// SWC file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// walk | memoized | shortest-path | all
        #[arg(short, long)]
        method: Option<DiameterMethod>,
        /// Keep only these compartments (name or SWC code, repeatable)
        #[arg(short = 't', long = "compartment")]
        compartments: Vec<String>,
        /// Write the longest path as SWC
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        export: Option<PathBuf>,
    },

    /// List tip nodes
    Leaves {
        /// SWC file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Keep only these compartments (name or SWC code, repeatable)
        #[arg(short = 't', long = "compartment")]
        compartments: Vec<String>,
    },

    /// Measure every SWC file of a directory
    Measure {
        /// Directory to scan
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// Regex on file names
        #[arg(short, long)]
        filter: Option<String>,
        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// walk | memoized | shortest-path | all
        #[arg(short, long)]
        method: Option<DiameterMethod>,
    },

    /// Show topology as a text tree
    Tree {
        /// SWC file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Show every node instead of root, branch points and tips only
        #[arg(long)]
        full: bool,
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
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print config template
    Template,
}
