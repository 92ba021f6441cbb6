use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mnemo_store::{
    CancelToken, MemoryStore, ProjectInfo, TemplateBundle, load_template_dir, seeded_document,
};
use tracing::debug;

use crate::agents_file::{AGENTS_FILE, create_agent_symlinks, update_agents_file};

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub force: bool,
    pub template_dir: Option<PathBuf>,
    pub info: ProjectInfo,
}

#[derive(Debug)]
pub struct InitReport {
    pub memory_path: PathBuf,
    pub agents_path: PathBuf,
    pub seeded_files: usize,
    pub warnings: Vec<String>,
}

/// Write the seeded memory file, then the AGENTS.md block and symlinks.
pub fn run_init(
    root: &Path,
    store: &MemoryStore,
    ctx: &CancelToken,
    options: &InitOptions,
) -> Result<InitReport> {
    let bundle = match &options.template_dir {
        Some(dir) => load_template_dir(dir, &options.info)
            .with_context(|| format!("failed to load templates from {}", dir.display()))?,
        None => TemplateBundle::default(),
    };
    debug!(files = bundle.files.len(), "template bundle loaded");

    let document = seeded_document(&bundle, &options.info, store.now());
    store.initialize(ctx, &document, options.force)?;

    update_agents_file(root, bundle.agents_content())?;
    let warnings = create_agent_symlinks(root);

    Ok(InitReport {
        memory_path: store.file_path().to_path_buf(),
        agents_path: root.join(AGENTS_FILE),
        seeded_files: bundle.files.len(),
        warnings,
    })
}

pub fn print_report(report: &InitReport) {
    println!("Created {}", report.memory_path.display());
    if report.seeded_files > 0 {
        println!("  seeded from {} template file(s)", report.seeded_files);
    }
    println!("Updated {}", report.agents_path.display());
    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }
}
