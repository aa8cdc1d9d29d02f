//! Source text transformation.
//!
//! All rewrites here are structural text surgery, not parsing. That is a
//! deliberate trade-off: the transforms always terminate and leave anything
//! they do not recognize byte-for-byte untouched, at the cost of not
//! handling every conceivable source shape. When an anchor cannot be found
//! the operation degrades to a manual-edit instruction instead of guessing.

pub mod barrel;
pub mod wiring;

use crate::config::{qualified_file_name, ProjectConfig};
use crate::types::ComponentType;
use std::str::FromStr;

/// The framework's self-referential module specifier prefix. Registry
/// component sources import their siblings as
/// `@loadout/<type-dir>/<name>`; installation rewrites these to the
/// consuming project's aliases.
pub const FRAMEWORK_PREFIX: &str = "@loadout/";

/// Rewrite framework self-imports in fetched source text.
///
/// Every import whose specifier starts with [`FRAMEWORK_PREFIX`] is mapped
/// to the project alias for the referenced component type plus the
/// (namespace-qualified) file stem. All other lines are untouched. Pure
/// function of (content, namespace, config); its output feeds the ledger
/// content hash.
pub fn rewrite_imports(content: &str, namespace: &str, config: &ProjectConfig) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        if is_import_line(line) {
            out.push_str(&rewrite_line(line, namespace, config));
        } else {
            out.push_str(line);
        }
    }
    out
}

fn is_import_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("import ")
        || trimmed.starts_with("import\"")
        || trimmed.starts_with("import'")
        || trimmed.starts_with("export ")
        || line.contains(" from ")
}

fn rewrite_line(line: &str, namespace: &str, config: &ProjectConfig) -> String {
    for quote in ['"', '\''] {
        let open_pat = format!("{}{}", quote, FRAMEWORK_PREFIX);
        if let Some(start) = line.find(&open_pat) {
            let spec_start = start + 1;
            if let Some(rel_end) = line[spec_start..].find(quote) {
                let spec = &line[spec_start..spec_start + rel_end];
                if let Some(rewritten) = rewrite_specifier(spec, namespace, config) {
                    let mut out = String::with_capacity(line.len());
                    out.push_str(&line[..spec_start]);
                    out.push_str(&rewritten);
                    out.push_str(&line[spec_start + rel_end..]);
                    return out;
                }
            }
        }
    }
    line.to_string()
}

/// Map `@loadout/<type-dir>/<rest>` to `<alias>/<qualified rest>`.
/// Unrecognized specifiers are left alone.
fn rewrite_specifier(spec: &str, namespace: &str, config: &ProjectConfig) -> Option<String> {
    let rest = spec.strip_prefix(FRAMEWORK_PREFIX)?;
    let (type_dir, file) = rest.split_once('/')?;
    let component_type = type_from_dir(type_dir)?;
    let alias = config.alias_for(component_type);
    // Extensionless specifiers stay extensionless after qualification.
    let qualified = qualified_file_name(file, namespace);
    Some(format!("{}/{}", alias, qualified))
}

fn type_from_dir(dir: &str) -> Option<ComponentType> {
    for candidate in ["agent", "tool", "skill", "storage", "cron", "package"] {
        let ty = ComponentType::from_str(candidate).ok()?;
        if ty.type_dir() == dir {
            return Some(ty);
        }
    }
    None
}
