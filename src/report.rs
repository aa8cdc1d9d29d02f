//! Format install, removal, and list output as text.

use crate::install::materializer::WriteResult;
use crate::install::{InstallReport, UninstallReport};
use crate::ledger::InstallLedger;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline. Respects NO_COLOR and TTY.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Human-readable summary of an install run.
pub fn format_install_text(report: &InstallReport) -> String {
    let mut out = String::new();
    for component in &report.components {
        out.push_str(&format!(
            "{}\n",
            format_section_heading(&format!(
                "{} {}@{} ({})",
                "Installed", component.key, component.version, component.component_type
            ))
        ));
        if let Some(replaced) = &component.replaced {
            out.push_str(&format!("  Replaced same-slot component: {}\n", replaced));
        }
        for file in &component.files {
            let line = match file.result {
                WriteResult::Written => {
                    format!("  {} {}", "+".green(), file.target.display())
                }
                WriteResult::SkippedIdentical => {
                    format!("  {} {} (already current)", "=".dimmed(), file.target.display())
                }
                WriteResult::KeptLocal => {
                    format!("  {} {} (kept local version)", "!".yellow(), file.target.display())
                }
            };
            out.push_str(&line);
            out.push('\n');
        }
        if !component.env_vars.is_empty() {
            out.push_str("  Environment variables to set:\n");
            for (name, description) in &component.env_vars {
                out.push_str(&format!("    {}  {}\n", name.bold(), description));
            }
        }
        if let Some(docs) = &component.docs {
            out.push_str(&format!("  Docs: {}\n", docs));
        }
        for warning in &component.warnings {
            out.push_str(&format!("  {} {}\n", "warning:".yellow(), warning));
        }
        out.push('\n');
    }
    let total_files: usize = report.components.iter().map(|c| c.files.len()).sum();
    out.push_str(&format!(
        "{} component(s), {} file(s) processed\n",
        report.components.len(),
        total_files
    ));
    out
}

/// Human-readable summary of a removal.
pub fn format_uninstall_text(report: &UninstallReport) -> String {
    let mut out = format!("Removed component: {}\n", report.key);
    for file in &report.files {
        out.push_str(&format!("  - {}\n", file.display()));
    }
    out
}

/// Table of installed components from the ledger.
pub fn format_list_text(ledger: &InstallLedger) -> String {
    if ledger.is_empty() {
        return "No components installed\n".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Component", "Type", "Slot", "Version", "Installed", "Files"]);
    for (key, entry) in ledger.entries() {
        table.add_row(vec![
            key.clone(),
            entry.component_type.to_string(),
            entry.slot.clone().unwrap_or_else(|| "-".to_string()),
            entry.version.clone(),
            entry.installed_at.format("%Y-%m-%d %H:%M").to_string(),
            entry.files.len().to_string(),
        ]);
    }
    format!("{}\n", table)
}
