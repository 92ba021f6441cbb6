use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mnemo_config::MnemoConfig;
use mnemo_core::{AppendInput, SystemClock, UlidGenerator};
use mnemo_store::{CancelToken, MemoryService, MemoryStore, ProjectInfo, StoreConfig};
use tracing::debug;

mod agents_file;
mod cli;
mod init_cmd;
mod logging;
mod memory_cmd;
mod tools;

use cli::{Cli, Commands, ToolCommands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_root = determine_project_root(cli.cd.as_deref())?;
    let config = MnemoConfig::load(&project_root)?;

    let log_dir = mnemo_config::paths::state_dir()
        .unwrap_or_else(mnemo_config::paths::state_dir_fallback)
        .join("logs");
    let _log_guards = logging::init(&log_dir, config.debug_enabled())?;

    let store = build_store(&project_root, &config);
    // The lock wait is bounded by `storage.lock_timeout_secs`; nothing in the
    // CLI cancels it early.
    let ctx = CancelToken::new();

    match cli.command {
        Commands::Init {
            force,
            yes,
            template_dir,
            language,
            framework,
            project_type,
            database,
            features,
        } => {
            // init never prompts; --yes is accepted for scripted callers.
            debug!(yes = yes || config.init.yes, "running init");
            let options = init_cmd::InitOptions {
                force,
                template_dir: template_dir.or_else(|| config.init.template_dir()),
                info: ProjectInfo {
                    language: language.unwrap_or_default(),
                    framework,
                    project_type,
                    database,
                    features,
                },
            };
            let report = init_cmd::run_init(&project_root, &store, &ctx, &options)?;
            init_cmd::print_report(&report);
        }
        Commands::Read => {
            memory_cmd::handle_read(&MemoryService::new(store))?;
        }
        Commands::Section { category, json } => {
            memory_cmd::handle_section(&MemoryService::new(store), category, json)?;
        }
        Commands::Capture {
            category,
            tag,
            content,
            rationale,
        } => {
            let input = AppendInput {
                category,
                tag,
                content,
                rationale,
            };
            memory_cmd::handle_capture(&MemoryService::new(store), &ctx, input)?;
        }
        Commands::Tool { cmd } => match cmd {
            ToolCommands::List => memory_cmd::handle_tool_list()?,
            ToolCommands::Call { name, args } => {
                memory_cmd::handle_tool_call(&MemoryService::new(store), &ctx, &name, &args)?;
            }
        },
    }

    Ok(())
}

fn determine_project_root(cd: Option<&Path>) -> Result<PathBuf> {
    let root = match cd {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("Project root not found: {}", root.display()))
}

fn build_store(project_root: &Path, config: &MnemoConfig) -> MemoryStore {
    let store_config = StoreConfig {
        base_path: project_root.to_path_buf(),
        dir_name: config.storage.dir_name.clone(),
        file_name: config.storage.file_name.clone(),
        lock_file_name: config.storage.lock_file_name.clone(),
        lock_timeout: config.storage.lock_timeout(),
    };
    MemoryStore::new(store_config, Arc::new(UlidGenerator), Arc::new(SystemClock))
}
