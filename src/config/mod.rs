//! Project configuration.
//!
//! `loadout.toml` at the project root holds the import aliases per component
//! type and the named registries components are fetched from. The installer
//! treats this file as read-mostly input; `init` writes a starter config.

use crate::error::InstallError;
use crate::types::{ComponentType, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project configuration file name.
pub const CONFIG_FILE: &str = "loadout.toml";

/// URL template for the default registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.loadout.dev/r/{type}/{name}.json";

/// One named registry: a URL template containing `{type}` and `{name}`
/// placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Import aliases, one per component type. Values beginning with `@/` map
/// under the project `src/` directory; anything else is a literal
/// project-relative directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aliases {
    #[serde(default = "default_agents_alias")]
    pub agents: String,
    #[serde(default = "default_tools_alias")]
    pub tools: String,
    #[serde(default = "default_skills_alias")]
    pub skills: String,
    #[serde(default = "default_storage_alias")]
    pub storage: String,
    #[serde(default = "default_crons_alias")]
    pub crons: String,
    #[serde(default = "default_packages_alias")]
    pub packages: String,
}

fn default_agents_alias() -> String {
    "@/agents".to_string()
}
fn default_tools_alias() -> String {
    "@/tools".to_string()
}
fn default_skills_alias() -> String {
    "@/skills".to_string()
}
fn default_storage_alias() -> String {
    "@/storage".to_string()
}
fn default_crons_alias() -> String {
    "@/crons".to_string()
}
fn default_packages_alias() -> String {
    "@/packages".to_string()
}

impl Default for Aliases {
    fn default() -> Self {
        Self {
            agents: default_agents_alias(),
            tools: default_tools_alias(),
            skills: default_skills_alias(),
            storage: default_storage_alias(),
            crons: default_crons_alias(),
            packages: default_packages_alias(),
        }
    }
}

/// Project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Framework identifier consumed by scaffolding collaborators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Runtime identifier consumed by scaffolding collaborators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    /// Barrel manifest file aggregating side-effect imports.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    #[serde(default)]
    pub aliases: Aliases,

    /// Named registries, keyed by namespace.
    #[serde(default)]
    pub registries: BTreeMap<String, RegistryConfig>,
}

fn default_manifest() -> String {
    "src/index.ts".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let mut registries = BTreeMap::new();
        registries.insert(
            DEFAULT_NAMESPACE.to_string(),
            RegistryConfig {
                url: DEFAULT_REGISTRY_URL.to_string(),
                homepage: None,
                description: None,
            },
        );
        Self {
            framework: None,
            runtime: None,
            manifest: default_manifest(),
            aliases: Aliases::default(),
            registries,
        }
    }
}

impl ProjectConfig {
    /// Load from `<root>/loadout.toml`.
    pub fn load(project_root: &Path) -> Result<Self, InstallError> {
        let path = project_root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            InstallError::ConfigError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            InstallError::ConfigError(format!(
                "Failed to parse {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Write to `<root>/loadout.toml`.
    pub fn save(&self, project_root: &Path) -> Result<PathBuf, InstallError> {
        let path = project_root.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)
            .map_err(|e| InstallError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn registry(&self, namespace: &str) -> Result<&RegistryConfig, InstallError> {
        self.registries.get(namespace).ok_or_else(|| {
            InstallError::ConfigError(format!(
                "No registry configured for namespace '{}'",
                namespace
            ))
        })
    }

    /// Import alias for a component type, e.g. `@/tools`.
    pub fn alias_for(&self, component_type: ComponentType) -> &str {
        match component_type {
            ComponentType::Agent => &self.aliases.agents,
            ComponentType::Tool => &self.aliases.tools,
            ComponentType::Skill => &self.aliases.skills,
            ComponentType::Storage => &self.aliases.storage,
            ComponentType::Cron => &self.aliases.crons,
            ComponentType::Package => &self.aliases.packages,
        }
    }

    /// Install directory for a component type, relative to the project root.
    pub fn install_dir(&self, component_type: ComponentType) -> PathBuf {
        alias_to_dir(self.alias_for(component_type))
    }

    /// Path of the barrel manifest, relative to the project root.
    pub fn manifest_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.manifest)
    }
}

/// Map an import alias to an install directory: `@/tools` becomes
/// `src/tools`; any other value is taken as a literal relative directory.
pub fn alias_to_dir(alias: &str) -> PathBuf {
    if let Some(rest) = alias.strip_prefix("@/") {
        Path::new("src").join(rest)
    } else {
        PathBuf::from(alias)
    }
}

/// Qualify a file name with its namespace to avoid collisions between
/// same-named components from different registries: `weather.ts` from the
/// `community` namespace installs as `weather.community.ts`. Default
/// namespace files keep their name.
pub fn qualified_file_name(file_name: &str, namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}.{}.{}", stem, namespace, ext),
        None => format!("{}.{}", file_name, namespace),
    }
}
