//! Template bundles used to seed a new memory file at `init` time.
//!
//! A bundle directory looks like:
//!
//! ```text
//! <dir>/agents.md                      optional agent instructions
//! <dir>/bases/common/memory.md         constraints block
//! <dir>/bases/common/<category>.md     block for that category
//! <dir>/languages/<lang>/...           same layout, read when <lang> is detected
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mnemo_core::SectionType;
use mnemo_core::types::DOCUMENT_SECTIONS;

use crate::document::{DetectedStack, FrontMatter, render_document, strip_front_matter};

/// Project facts supplied by the caller; nothing here detects them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    pub language: String,
    pub framework: Option<String>,
    /// e.g. `backend`, `frontend`, `cli`, `library`.
    pub project_type: Option<String>,
    pub database: Option<String>,
    pub features: Vec<String>,
}

impl ProjectInfo {
    pub fn is_detected(&self) -> bool {
        !self.language.is_empty() && self.language != "unknown"
    }

    fn detected_stack(&self) -> Option<DetectedStack> {
        self.is_detected().then(|| DetectedStack {
            language: self.language.clone(),
            framework: self.framework.clone().filter(|f| !f.is_empty()),
            project_type: self.project_type.clone().filter(|t| !t.is_empty()),
            database: self.database.clone().filter(|d| !d.is_empty()),
            features: self
                .features
                .iter()
                .filter(|f| !f.is_empty())
                .cloned()
                .collect(),
        })
    }
}

/// One pre-fetched text block and the category it seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryTemplateFile {
    /// Where the block came from, e.g. `bases/common` or `languages/rust`.
    pub source: String,
    pub category: String,
    pub content: String,
}

impl MemoryTemplateFile {
    /// Section the block lands in; unknown categories go to Constraints.
    pub fn target_section(&self) -> SectionType {
        match self.category.parse::<SectionType>() {
            Ok(SectionType::Note) | Err(_) => SectionType::Constraints,
            Ok(section) => section,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateBundle {
    pub files: Vec<MemoryTemplateFile>,
    pub agents: Option<String>,
}

impl TemplateBundle {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Agent instructions from the bundle, or the built-in default.
    pub fn agents_content(&self) -> &str {
        self.agents.as_deref().unwrap_or(DEFAULT_AGENTS_CONTENT)
    }
}

/// Full document for `init`: front matter (with the stack when detected) and
/// the four headings carrying the bundle's blocks.
pub fn seeded_document(bundle: &TemplateBundle, info: &ProjectInfo, now: DateTime<Utc>) -> String {
    let front_matter = FrontMatter {
        created_at: now,
        generated_by: Some("mnemo init".to_string()),
        detected_stack: info.detected_stack(),
    };
    let blocks: Vec<(SectionType, String)> = bundle
        .files
        .iter()
        .map(|file| (file.target_section(), file.content.clone()))
        .collect();
    render_document(&front_matter, &blocks)
}

/// Load a bundle from a local directory.
///
/// Missing subdirectories are skipped; an unreadable file is an error.
pub fn load_template_dir(dir: &Path, info: &ProjectInfo) -> Result<TemplateBundle> {
    if !dir.is_dir() {
        anyhow::bail!("template directory not found: {}", dir.display());
    }

    let mut bundle = TemplateBundle::default();
    load_source(dir, "bases/common", &mut bundle.files)?;
    if info.is_detected() {
        let source = format!("languages/{}", info.language);
        load_source(dir, &source, &mut bundle.files)?;
    }

    let agents_path = dir.join("agents.md");
    if agents_path.is_file() {
        let agents = fs::read_to_string(&agents_path)
            .with_context(|| format!("failed to read {}", agents_path.display()))?;
        bundle.agents = Some(agents);
    }

    Ok(bundle)
}

fn load_source(dir: &Path, source: &str, files: &mut Vec<MemoryTemplateFile>) -> Result<()> {
    let source_dir = dir.join(source);
    if !source_dir.is_dir() {
        return Ok(());
    }

    let mut candidates = vec![("memory.md".to_string(), "constraints")];
    candidates.extend(
        DOCUMENT_SECTIONS
            .iter()
            .map(|section| (format!("{}.md", section.as_str()), section.as_str())),
    );

    for (file_name, category) in candidates {
        let path = source_dir.join(&file_name);
        if !path.is_file() {
            continue;
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read template {}", path.display()))?;
        files.push(MemoryTemplateFile {
            source: source.to_string(),
            category: category.to_string(),
            content: strip_front_matter(&content).to_string(),
        });
    }
    Ok(())
}

pub const DEFAULT_AGENTS_CONTENT: &str = "### Boot Protocol

At the **START** of every conversation:
1. Call `mnemo_read` to load project constraints
2. Review all Constraints before writing any code
3. Apply Patterns to maintain consistency

### Memory Protocol

When you identify important information:

| Type | When to Record |
|------|----------------|
| **Constraint** | Technical requirements, must/must-not rules |
| **Decision** | Architecture choices with rationale |
| **Pattern** | Code style, naming conventions |
| **Anti-Pattern** | Failed approaches, things to avoid |

Use `mnemo_capture` with the matching category and a short tag.

### Enforcement

- **Constraints** are non-negotiable. Stop and clarify if a request conflicts.
- **Patterns** should be followed for consistency.
- **Anti-Patterns** are warnings. Suggest alternatives if they are requested.
";
