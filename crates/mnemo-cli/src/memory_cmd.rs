use anyhow::{Context, Result};
use mnemo_core::{AppendInput, Section, SectionType};
use mnemo_store::{CancelToken, MemoryService};
use serde_json::Value;

use crate::tools::{call_tool, get_tools};

pub fn handle_read(service: &MemoryService) -> Result<()> {
    print!("{}", service.read_memory()?);
    Ok(())
}

pub fn handle_section(service: &MemoryService, category: SectionType, json: bool) -> Result<()> {
    let section = service.read_section(category)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&section)?);
    } else {
        print!("{}", format_section(&section));
    }
    Ok(())
}

pub fn handle_capture(service: &MemoryService, ctx: &CancelToken, input: AppendInput) -> Result<()> {
    let receipt = service.capture(ctx, &input)?;
    if receipt.section != receipt.stored_in {
        eprintln!(
            "note: '{}' entries are stored under {}",
            receipt.section,
            receipt.stored_in.heading()
        );
    }
    println!("{}", receipt.id);
    Ok(())
}

pub fn handle_tool_list() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&get_tools())?);
    Ok(())
}

pub fn handle_tool_call(
    service: &MemoryService,
    ctx: &CancelToken,
    name: &str,
    args: &str,
) -> Result<()> {
    let arguments: Value = serde_json::from_str(args).context("invalid --args JSON")?;
    let result = call_tool(service, ctx, name, &arguments);
    println!("{}", serde_json::to_string_pretty(&result)?);
    if result.is_error {
        anyhow::bail!("tool {name} failed");
    }
    Ok(())
}

fn format_section(section: &Section) -> String {
    let mut out = format!(
        "{} ({} entries)\n",
        section.section_type.heading(),
        section.entries.len()
    );
    for entry in &section.entries {
        let id = entry.id.as_deref().unwrap_or("-");
        let time = entry
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("  {id}  {time}  {} {}\n", entry.tag, entry.content));
        if let Some(rationale) = &entry.rationale {
            out.push_str(&format!("      rationale: {rationale}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mnemo_core::Entry;

    #[test]
    fn test_format_section() {
        let section = Section {
            section_type: SectionType::AntiPatterns,
            entries: vec![
                Entry {
                    id: Some("01HQ".into()),
                    tag: "[Sql]".into(),
                    tag_name: "Sql".into(),
                    content: "No string-built queries".into(),
                    rationale: Some("injection".into()),
                    created_at: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
                },
                Entry {
                    id: None,
                    tag: "[Old]".into(),
                    tag_name: "Old".into(),
                    content: "Legacy line".into(),
                    rationale: None,
                    created_at: None,
                },
            ],
            format: None,
        };
        assert_eq!(
            format_section(&section),
            "Anti-Patterns (2 entries)\n  \
             01HQ  2024-01-15 10:30  [Sql] No string-built queries\n      \
             rationale: injection\n  \
             -  -  [Old] Legacy line\n"
        );
    }

    #[test]
    fn test_format_empty_section() {
        assert_eq!(
            format_section(&Section::empty(SectionType::Decisions)),
            "Decisions (0 entries)\n"
        );
    }
}
