pub mod node_graph;
pub mod settings;
pub mod share;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Compile, inspect and share pattern-flow graphs
#[derive(Parser)]
#[command(name = "patternflow")]
#[command(about = "Compile node graphs into pattern programs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the compiled program of a project file
    Compile { project: PathBuf },

    /// List the pattern groups of a project file
    Groups { project: PathBuf },

    /// Print a share link (or bare payload) for a project file
    Share {
        project: PathBuf,

        /// Page to attach the payload to
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Decode a share link or payload and print the project as JSON
    Open { input: String },

    /// Feed a project through the runner, printing what the engine receives
    Play { project: PathBuf },

    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List available node types
    NodeTypes,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Get,
    Set { key: String, value: String },
}
