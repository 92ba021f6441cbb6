//! Managed block in `AGENTS.md`, plus the symlinks other agents read.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};

pub const AGENTS_FILE: &str = "AGENTS.md";
pub const BLOCK_START: &str = "<!-- mnemo:start -->";
pub const BLOCK_END: &str = "<!-- mnemo:end -->";

/// Files linked to `AGENTS.md` so tools with their own convention see it.
pub const AGENT_SYMLINKS: [&str; 2] = ["CLAUDE.md", ".cursorrules"];

fn managed_block(agents_content: &str) -> String {
    format!(
        "{BLOCK_START}\n\
         <!--\n  \
         This section is managed by mnemo.\n  \
         Manual edits within this block may be overwritten.\n  \
         Last updated: {}\n\
         -->\n\
         \n\
         {}\n\
         {BLOCK_END}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        agents_content.trim_end()
    )
}

/// Replace the managed block in `existing`, or append one after a blank line.
pub fn upsert_block(existing: &str, agents_content: &str) -> String {
    let block = managed_block(agents_content);

    if let Some(start) = existing.find(BLOCK_START)
        && let Some(end_offset) = existing[start..].find(BLOCK_END)
    {
        let end = start + end_offset + BLOCK_END.len();
        return format!("{}{block}{}", &existing[..start], &existing[end..]);
    }

    let mut content = existing.to_string();
    if !content.is_empty() && !content.ends_with("\n\n") {
        content.push_str(if content.ends_with('\n') { "\n" } else { "\n\n" });
    }
    content.push_str(&block);
    content.push('\n');
    content
}

/// Create or update `<root>/AGENTS.md`.
pub fn update_agents_file(root: &Path, agents_content: &str) -> Result<()> {
    let path = root.join(AGENTS_FILE);
    let existing = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    fs::write(&path, upsert_block(&existing, agents_content))
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Link each of [`AGENT_SYMLINKS`] to `AGENTS.md`.
///
/// Failures are not fatal; each one comes back as a warning line. A regular
/// file already at a link path is left alone.
pub fn create_agent_symlinks(root: &Path) -> Vec<String> {
    AGENT_SYMLINKS
        .iter()
        .filter_map(|link| {
            ensure_symlink(&root.join(link), AGENTS_FILE)
                .err()
                .map(|e| format!("failed to create symlink {link}: {e:#}"))
        })
        .collect()
}

#[cfg(unix)]
fn ensure_symlink(link_path: &Path, target: &str) -> Result<()> {
    if let Ok(meta) = fs::symlink_metadata(link_path) {
        if !meta.file_type().is_symlink() {
            anyhow::bail!("file exists and is not a symlink");
        }
        if fs::read_link(link_path).is_ok_and(|current| current == Path::new(target)) {
            return Ok(());
        }
        fs::remove_file(link_path)
            .with_context(|| format!("failed to remove stale link {}", link_path.display()))?;
    }
    std::os::unix::fs::symlink(target, link_path)
        .with_context(|| format!("failed to link {}", link_path.display()))
}

#[cfg(not(unix))]
fn ensure_symlink(_link_path: &Path, _target: &str) -> Result<()> {
    anyhow::bail!("symlinks are only created on unix")
}
