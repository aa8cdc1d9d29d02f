//! File materialization.
//!
//! Computes per-file installation status against the existing project tree
//! and applies writes under the overwrite policy. Writes are strictly
//! sequential so the diff-against-disk check stays valid for each file, and
//! every decision is local to one file.

use crate::config::{qualified_file_name, ProjectConfig};
use crate::error::InstallError;
use crate::interact::Interaction;
use crate::registry::{ComponentFile, ComponentItem};
use crate::types::ComponentType;
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};

/// Status of one target file relative to the content about to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// No file on disk yet.
    New,
    /// On-disk content is byte-identical; nothing to do.
    Identical,
    /// On-disk content differs; needs an overwrite decision.
    Different,
}

/// One planned write.
#[derive(Debug, Clone)]
pub struct FileOp {
    /// Project-relative target path.
    pub target: PathBuf,
    /// Rewritten content to write.
    pub content: String,
    pub status: FileStatus,
}

/// What actually happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Written,
    SkippedIdentical,
    KeptLocal,
}

/// Project-relative install path for one file of a component.
///
/// Package items preserve their relative directory structure under the
/// package base directory; every other kind installs each file directly
/// under the kind's alias directory, with the namespace-qualified filename
/// rule applied for non-default namespaces.
pub fn target_path(config: &ProjectConfig, item: &ComponentItem, file: &ComponentFile) -> PathBuf {
    let base = config.install_dir(item.component_type);
    if item.component_type == ComponentType::Package {
        return base.join(&file.path);
    }
    let file_name = Path::new(&file.path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(&file.path);
    base.join(qualified_file_name(file_name, &item.namespace))
}

/// Compare the (already rewritten) content against the current disk state.
pub fn plan_file(
    project_root: &Path,
    target: PathBuf,
    content: String,
) -> Result<FileOp, InstallError> {
    let absolute = project_root.join(&target);
    let status = if !absolute.exists() {
        FileStatus::New
    } else {
        let existing = std::fs::read_to_string(&absolute)?;
        if existing == content {
            FileStatus::Identical
        } else {
            FileStatus::Different
        }
    };
    Ok(FileOp {
        target,
        content,
        status,
    })
}

/// Apply one planned write under the overwrite policy.
///
/// `overwrite_all` writes unconditionally for `Different` files; otherwise
/// the interaction decides per file, defaulting to keeping the local copy.
pub fn apply_file(
    project_root: &Path,
    op: &FileOp,
    overwrite_all: bool,
    interaction: &dyn Interaction,
) -> Result<WriteResult, InstallError> {
    match op.status {
        FileStatus::Identical => Ok(WriteResult::SkippedIdentical),
        FileStatus::New => {
            write_file(project_root, op)?;
            Ok(WriteResult::Written)
        }
        FileStatus::Different => {
            if overwrite_all {
                write_file(project_root, op)?;
                return Ok(WriteResult::Written);
            }
            let absolute = project_root.join(&op.target);
            let existing = std::fs::read_to_string(&absolute)?;
            let diff = render_diff(&existing, &op.content, &op.target);
            if interaction.confirm_overwrite(&op.target, &diff)? {
                write_file(project_root, op)?;
                Ok(WriteResult::Written)
            } else {
                Ok(WriteResult::KeptLocal)
            }
        }
    }
}

fn write_file(project_root: &Path, op: &FileOp) -> Result<(), InstallError> {
    let absolute = project_root.join(&op.target);
    if let Some(parent) = absolute.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&absolute, &op.content)?;
    tracing::debug!(path = %op.target.display(), "wrote file");
    Ok(())
}

/// Human-readable old-vs-new diff for the overwrite prompt.
pub fn render_diff(old: &str, new: &str, path: &Path) -> String {
    let mut out = format!("--- {} (local)\n+++ {} (registry)\n", path.display(), path.display());
    let diff = TextDiff::from_lines(old, new);
    for change in diff.iter_all_changes() {
        let line = change.value();
        match change.tag() {
            ChangeTag::Delete => out.push_str(&format!("{}", format!("-{}", line).red())),
            ChangeTag::Insert => out.push_str(&format!("{}", format!("+{}", line).green())),
            ChangeTag::Equal => {
                out.push(' ');
                out.push_str(line);
            }
        }
        if !line.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::NonInteractive;
    use crate::registry::ComponentFile;
    use crate::types::DEFAULT_NAMESPACE;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn item(ty: ComponentType, namespace: &str) -> ComponentItem {
        ComponentItem {
            name: "weather-tool".to_string(),
            component_type: ty,
            version: "1.0.0".to_string(),
            slot: None,
            files: Vec::new(),
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
            registry_dependencies: Vec::new(),
            env_vars: BTreeMap::new(),
            docs: None,
            namespace: namespace.to_string(),
        }
    }

    fn file(path: &str) -> ComponentFile {
        ComponentFile {
            path: path.to_string(),
            content: "export {};\n".to_string(),
        }
    }

    #[test]
    fn test_singleton_target_flattens_path() {
        let config = ProjectConfig::default();
        let path = target_path(
            &config,
            &item(ComponentType::Tool, DEFAULT_NAMESPACE),
            &file("nested/dir/weather.ts"),
        );
        assert_eq!(path, Path::new("src/tools/weather.ts"));
    }

    #[test]
    fn test_namespaced_singleton_qualifies_filename() {
        let config = ProjectConfig::default();
        let path = target_path(
            &config,
            &item(ComponentType::Tool, "community"),
            &file("weather.ts"),
        );
        assert_eq!(path, Path::new("src/tools/weather.community.ts"));
    }

    #[test]
    fn test_package_target_preserves_structure() {
        let config = ProjectConfig::default();
        let path = target_path(
            &config,
            &item(ComponentType::Package, DEFAULT_NAMESPACE),
            &file("chat-ui/components/window.tsx"),
        );
        assert_eq!(path, Path::new("src/packages/chat-ui/components/window.tsx"));
    }

    #[test]
    fn test_plan_statuses() {
        let dir = tempdir().unwrap();
        let target = PathBuf::from("src/tools/weather.ts");

        let op = plan_file(dir.path(), target.clone(), "a\n".to_string()).unwrap();
        assert_eq!(op.status, FileStatus::New);

        std::fs::create_dir_all(dir.path().join("src/tools")).unwrap();
        std::fs::write(dir.path().join(&target), "a\n").unwrap();
        let op = plan_file(dir.path(), target.clone(), "a\n".to_string()).unwrap();
        assert_eq!(op.status, FileStatus::Identical);

        let op = plan_file(dir.path(), target, "b\n".to_string()).unwrap();
        assert_eq!(op.status, FileStatus::Different);
    }

    #[test]
    fn test_apply_new_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let op = FileOp {
            target: PathBuf::from("src/deep/nested/x.ts"),
            content: "x\n".to_string(),
            status: FileStatus::New,
        };
        let result = apply_file(dir.path(), &op, false, &NonInteractive).unwrap();
        assert_eq!(result, WriteResult::Written);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/deep/nested/x.ts")).unwrap(),
            "x\n"
        );
    }

    #[test]
    fn test_apply_different_keeps_local_by_default() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("x.ts"), "local edit\n").unwrap();
        let op = FileOp {
            target: PathBuf::from("x.ts"),
            content: "registry version\n".to_string(),
            status: FileStatus::Different,
        };
        let result = apply_file(dir.path(), &op, false, &NonInteractive).unwrap();
        assert_eq!(result, WriteResult::KeptLocal);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("x.ts")).unwrap(),
            "local edit\n"
        );
    }

    #[test]
    fn test_apply_different_with_overwrite_flag() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("x.ts"), "local edit\n").unwrap();
        let op = FileOp {
            target: PathBuf::from("x.ts"),
            content: "registry version\n".to_string(),
            status: FileStatus::Different,
        };
        let result = apply_file(dir.path(), &op, true, &NonInteractive).unwrap();
        assert_eq!(result, WriteResult::Written);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("x.ts")).unwrap(),
            "registry version\n"
        );
    }

    #[test]
    fn test_render_diff_marks_changes() {
        let diff = render_diff("a\nb\n", "a\nc\n", Path::new("x.ts"));
        assert!(diff.contains("x.ts"));
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }
}
