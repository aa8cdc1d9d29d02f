//! Install pipeline.
//!
//! Drives one resolved component set through slot checks, import rewriting,
//! file materialization, barrel maintenance, ledger recording, and the
//! external package-manager side effect. Resolution has already finished by
//! the time this runs, so every error surfaced here is per item; ledger
//! entries are written per component, immediately after that component's
//! files are in place.

pub mod materializer;
pub mod slots;

use crate::config::ProjectConfig;
use crate::error::InstallError;
use crate::interact::{Interaction, SlotDecision};
use crate::ledger::{content_hash, InstallLedger, LedgerEntry};
use crate::registry::ComponentItem;
use crate::transform::{barrel, rewrite_imports};
use materializer::{apply_file, plan_file, target_path, FileStatus, WriteResult};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Outcome for one file of one component.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub target: PathBuf,
    pub status: FileStatus,
    pub result: WriteResult,
}

/// Outcome for one installed component.
#[derive(Debug, Clone)]
pub struct ComponentReport {
    pub key: String,
    pub component_type: crate::types::ComponentType,
    pub version: String,
    pub files: Vec<FileReport>,
    /// Key of a same-slot component that was torn down first.
    pub replaced: Option<String>,
    pub env_vars: BTreeMap<String, String>,
    pub docs: Option<String>,
    pub warnings: Vec<String>,
}

/// Outcome of a whole install run.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub components: Vec<ComponentReport>,
}

/// Outcome of removing one component.
#[derive(Debug, Clone)]
pub struct UninstallReport {
    pub key: String,
    pub files: Vec<PathBuf>,
}

/// The install engine. Holds the mutable ledger by reference so tests can
/// run the whole pipeline against an in-memory ledger.
pub struct Installer<'a> {
    pub project_root: &'a Path,
    pub config: &'a ProjectConfig,
    pub ledger: &'a mut InstallLedger,
    pub interaction: &'a dyn Interaction,
    /// Global "always overwrite" policy from the CLI flag.
    pub overwrite: bool,
    /// Skip the external package-manager invocation entirely.
    pub skip_external: bool,
}

impl Installer<'_> {
    /// Install every item of a resolved, dependency-ordered set.
    pub fn install(&mut self, resolved: &[ComponentItem]) -> Result<InstallReport, InstallError> {
        let mut report = InstallReport::default();
        for item in resolved {
            report.components.push(self.install_item(item)?);
        }
        Ok(report)
    }

    fn install_item(&mut self, item: &ComponentItem) -> Result<ComponentReport, InstallError> {
        let key = item.key().ledger_key();
        let mut warnings = Vec::new();
        let mut replaced = None;

        if let Some(slot) = &item.slot {
            if let Some(conflict) = slots::find_conflict(self.ledger, &key, slot) {
                match self
                    .interaction
                    .resolve_slot_conflict(slot, &conflict.key, &key)?
                {
                    SlotDecision::Replace => {
                        let torn_down = self.uninstall(&conflict.key)?;
                        replaced = Some(torn_down.key);
                    }
                    SlotDecision::Add => {
                        tracing::info!(slot, existing = %conflict.key, incoming = %key,
                            "keeping both components in the same slot");
                    }
                }
            }
        }

        // Rewrite before diffing so status checks compare like-for-like.
        let mut planned = Vec::with_capacity(item.files.len());
        for file in &item.files {
            let rewritten = rewrite_imports(&file.content, &item.namespace, self.config);
            let target = target_path(self.config, item, file);
            planned.push(plan_file(self.project_root, target, rewritten)?);
        }

        let mut files = Vec::with_capacity(planned.len());
        for op in &planned {
            let result = apply_file(self.project_root, op, self.overwrite, self.interaction)?;
            files.push(FileReport {
                target: op.target.clone(),
                status: op.status,
                result,
            });
        }

        if item.component_type.in_barrel() {
            let manifest_rel = PathBuf::from(&self.config.manifest);
            for op in &planned {
                let import = manifest_import_path(&manifest_rel, &op.target);
                self.update_manifest(|content| barrel::add_import(content, &import))?;
            }
        }

        let hash = content_hash(planned.iter().map(|op| op.content.as_str()));
        let entry = LedgerEntry {
            registry: item.namespace.clone(),
            component_type: item.component_type,
            slot: item.slot.clone(),
            version: item.version.clone(),
            installed_at: chrono::Utc::now(),
            files: planned.iter().map(|op| op.target.clone()).collect(),
            hash,
            registry_dependencies: item.registry_dependencies.clone(),
        };
        self.ledger.record(key.clone(), entry)?;

        if !self.skip_external {
            if let Some(warning) = self.install_external(&item.dependencies, false) {
                warnings.push(warning);
            }
            if let Some(warning) = self.install_external(&item.dev_dependencies, true) {
                warnings.push(warning);
            }
        }

        Ok(ComponentReport {
            key,
            component_type: item.component_type,
            version: item.version.clone(),
            files,
            replaced,
            env_vars: item.env_vars.clone(),
            docs: item.docs.clone(),
            warnings,
        })
    }

    /// Remove an installed component: its files, its barrel imports, and its
    /// ledger entry. Also used for slot replacement teardown.
    pub fn uninstall(&mut self, key: &str) -> Result<UninstallReport, InstallError> {
        let entry = self
            .ledger
            .get(key)
            .cloned()
            .ok_or_else(|| InstallError::LedgerError(format!("Component not installed: {}", key)))?;

        let manifest_rel = PathBuf::from(&self.config.manifest);
        for target in &entry.files {
            if entry.component_type.in_barrel() {
                let import = manifest_import_path(&manifest_rel, target);
                self.update_manifest(|content| barrel::remove_import(content, &import))?;
            }
            let absolute = self.project_root.join(target);
            match std::fs::remove_file(&absolute) {
                Ok(()) => tracing::debug!(path = %target.display(), "removed file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.ledger.remove(key)?;
        Ok(UninstallReport {
            key: key.to_string(),
            files: entry.files,
        })
    }

    fn update_manifest(
        &self,
        edit: impl FnOnce(&str) -> String,
    ) -> Result<(), InstallError> {
        let path = self.config.manifest_path(self.project_root);
        let current = if path.exists() {
            std::fs::read_to_string(&path)?
        } else {
            "export {};\n".to_string()
        };
        let updated = edit(&current);
        if updated != current || !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, updated)?;
        }
        Ok(())
    }

    /// Black-box package-manager invocation. Failure is a warning, never a
    /// hard error: the source files are already correctly in place.
    fn install_external(&self, packages: &[String], dev: bool) -> Option<String> {
        if packages.is_empty() {
            return None;
        }
        let mut command = std::process::Command::new("npm");
        command.arg("install");
        if dev {
            command.arg("--save-dev");
        }
        command.args(packages).current_dir(self.project_root);
        match command.status() {
            Ok(status) if status.success() => None,
            Ok(status) => {
                let warning = format!(
                    "npm install {} exited with {}; install the packages manually",
                    packages.join(" "),
                    status
                );
                tracing::warn!("{}", warning);
                Some(warning)
            }
            Err(e) => {
                let warning = format!(
                    "Failed to run npm install {}: {}; install the packages manually",
                    packages.join(" "),
                    e
                );
                tracing::warn!("{}", warning);
                Some(warning)
            }
        }
    }
}

/// Import specifier for `target` as seen from the manifest file's directory.
fn manifest_import_path(manifest_rel: &Path, target: &Path) -> String {
    let manifest_dir: Vec<&str> = manifest_rel
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(n) => n.to_str(),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let target_parts: Vec<&str> = target
        .components()
        .filter_map(|c| match c {
            Component::Normal(n) => n.to_str(),
            _ => None,
        })
        .collect();

    let common = manifest_dir
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let ups = manifest_dir.len() - common;
    let mut out = String::new();
    if ups == 0 {
        out.push_str("./");
    } else {
        for _ in 0..ups {
            out.push_str("../");
        }
    }
    out.push_str(&target_parts[common..].join("/"));
    out
}
