use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mnemo_core::SectionType;

#[derive(Parser)]
#[command(name = "mnemo")]
#[command(about = "Project memory for coding agents, kept in a Markdown file")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root (defaults to CWD)
    #[arg(long, global = true)]
    pub cd: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .mnemo/memory.md and the AGENTS.md managed block
    Init {
        /// Overwrite an existing memory file
        #[arg(long)]
        force: bool,

        /// Accept defaults without asking
        #[arg(long, short = 'y')]
        yes: bool,

        /// Local template bundle (bases/common, languages/<lang>, agents.md)
        #[arg(long)]
        template_dir: Option<PathBuf>,

        /// Project language, selects languages/<lang> templates
        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        framework: Option<String>,

        /// backend, frontend, cli or library
        #[arg(long)]
        project_type: Option<String>,

        #[arg(long)]
        database: Option<String>,

        /// Notable project feature, repeatable
        #[arg(long = "feature")]
        features: Vec<String>,
    },

    /// Print the whole memory file
    Read,

    /// Print the entries of one section
    Section {
        #[arg(value_enum)]
        category: SectionType,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append an entry to the memory file
    Capture {
        /// constraints, decisions, patterns, anti-patterns or note (default)
        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        tag: String,

        #[arg(long)]
        content: String,

        #[arg(long, default_value = "")]
        rationale: String,
    },

    /// Inspect or invoke the agent-facing tools
    Tool {
        #[command(subcommand)]
        cmd: ToolCommands,
    },
}

#[derive(Subcommand)]
pub enum ToolCommands {
    /// Print tool descriptors as JSON
    List,

    /// Invoke a tool with JSON arguments
    Call {
        name: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}
