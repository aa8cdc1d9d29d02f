//! CLI Tooling
//!
//! Command-line interface for all Loadout operations. Project-scoped
//! commands with idempotent execution: re-running `add` against unchanged
//! registry content writes nothing.

use crate::config::{ProjectConfig, CONFIG_FILE};
use crate::error::InstallError;
use crate::install::Installer;
use crate::interact::{ConsoleInteraction, Interaction, NonInteractive};
use crate::ledger::InstallLedger;
use crate::logging::{init_logging, LoggingConfig};
use crate::registry::client::HttpRegistryClient;
use crate::registry::disambiguator::Disambiguator;
use crate::registry::resolver::{resolve, RegistryFetcher};
use crate::report::{format_install_text, format_list_text, format_uninstall_text};
use crate::transform::wiring::{link_tool, unlink_tool, BraceScanEditor, WiringOutcome};
use crate::types::{ComponentType, NameSpec};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loadout CLI - install registry components as editable source files
#[derive(Parser)]
#[command(name = "loadout")]
#[command(about = "Registry-based component installer for agent projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root directory
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve and install components with their registry dependencies
    Add {
        /// Component names ([namespace/]name[@version])
        names: Vec<String>,

        /// Restrict name resolution to one component type
        #[arg(long, value_name = "TYPE")]
        r#type: Option<String>,

        /// Overwrite locally modified files without prompting
        #[arg(long)]
        overwrite: bool,

        /// Never prompt; ambiguity fails and local edits are kept
        #[arg(long)]
        yes: bool,
    },
    /// Remove an installed component (files, manifest imports, ledger entry)
    Remove {
        /// Installed component key ([namespace/]name)
        name: String,
    },
    /// List installed components
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Wire an installed tool into an installed agent's tools map
    Link {
        /// Installed agent key
        agent: String,
        /// Installed tool key
        tool: String,
    },
    /// Remove a tool from an installed agent's tools map
    Unlink {
        /// Installed agent key
        agent: String,
        /// Installed tool key
        tool: String,
    },
    /// Write a starter loadout.toml and manifest
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

/// Execution context bound to one project root.
pub struct CliContext {
    project_root: PathBuf,
}

impl CliContext {
    pub fn new(project_root: PathBuf, logging: &LoggingConfig) -> Result<Self, InstallError> {
        init_logging(logging)?;
        Ok(Self { project_root })
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, InstallError> {
        match command {
            Commands::Add {
                names,
                r#type,
                overwrite,
                yes,
            } => {
                self.handle_add(names, r#type.as_deref(), *overwrite, *yes)
                    .await
            }
            Commands::Remove { name } => self.handle_remove(name),
            Commands::List { format } => self.handle_list(format),
            Commands::Link { agent, tool } => self.handle_link(agent, tool, true),
            Commands::Unlink { agent, tool } => self.handle_link(agent, tool, false),
            Commands::Init { force } => self.handle_init(*force),
        }
    }

    async fn handle_add(
        &self,
        names: &[String],
        type_filter: Option<&str>,
        overwrite: bool,
        yes: bool,
    ) -> Result<String, InstallError> {
        if names.is_empty() {
            return Err(InstallError::ConfigError(
                "No component names given".to_string(),
            ));
        }
        let config = ProjectConfig::load(&self.project_root)?;
        let type_filter = type_filter
            .map(ComponentType::from_str)
            .transpose()?;
        let specs = names
            .iter()
            .map(|n| NameSpec::parse(n))
            .collect::<Result<Vec<_>, _>>()?;

        let interaction = self.interaction(yes);
        let client = HttpRegistryClient::new(config.clone());

        let disambiguation = Disambiguator::new(&client, &config, interaction.as_ref())
            .disambiguate(&specs, type_filter)
            .await?;
        let fetcher = RegistryFetcher::new(&client, disambiguation.pinned_types);
        let resolved = resolve(&disambiguation.requests, &fetcher).await?;

        let mut ledger = InstallLedger::load(&self.project_root)?;
        let mut installer = Installer {
            project_root: &self.project_root,
            config: &config,
            ledger: &mut ledger,
            interaction: interaction.as_ref(),
            overwrite,
            skip_external: false,
        };
        let report = installer.install(&resolved)?;
        Ok(format_install_text(&report))
    }

    fn handle_remove(&self, name: &str) -> Result<String, InstallError> {
        let config = ProjectConfig::load(&self.project_root)?;
        let mut ledger = InstallLedger::load(&self.project_root)?;
        let mut installer = Installer {
            project_root: &self.project_root,
            config: &config,
            ledger: &mut ledger,
            interaction: &NonInteractive,
            overwrite: false,
            skip_external: true,
        };
        let report = installer.uninstall(name)?;
        Ok(format_uninstall_text(&report))
    }

    fn handle_list(&self, format: &str) -> Result<String, InstallError> {
        let ledger = InstallLedger::load(&self.project_root)?;
        if format == "json" {
            let entries: std::collections::BTreeMap<_, _> = ledger.entries().collect();
            serde_json::to_string_pretty(&entries)
                .map_err(|e| InstallError::LedgerError(format!("Failed to serialize: {}", e)))
        } else {
            Ok(format_list_text(&ledger))
        }
    }

    fn handle_link(&self, agent: &str, tool: &str, link: bool) -> Result<String, InstallError> {
        let config = ProjectConfig::load(&self.project_root)?;
        let ledger = InstallLedger::load(&self.project_root)?;

        let agent_entry = ledger.get(agent).ok_or_else(|| {
            InstallError::LedgerError(format!("Agent not installed: {}", agent))
        })?;
        let tool_entry = ledger.get(tool).ok_or_else(|| {
            InstallError::LedgerError(format!("Tool not installed: {}", tool))
        })?;
        let agent_file = agent_entry.files.first().ok_or_else(|| {
            InstallError::LedgerError(format!("Agent has no installed files: {}", agent))
        })?;
        let tool_file = tool_entry.files.first().ok_or_else(|| {
            InstallError::LedgerError(format!("Tool has no installed files: {}", tool))
        })?;

        let (key, symbol) = tool_identifiers(tool);
        let import_path = tool_import_path(&config, tool_file);

        let agent_path = self.project_root.join(agent_file);
        let source = std::fs::read_to_string(&agent_path)?;
        let outcome = if link {
            link_tool(&source, &key, &symbol, &import_path, &BraceScanEditor)
        } else {
            unlink_tool(&source, &key, &symbol, &BraceScanEditor)
        };
        match outcome {
            WiringOutcome::Updated(text) => {
                std::fs::write(&agent_path, text)?;
                Ok(format!(
                    "{} {} {} {} in {}",
                    if link { "Linked" } else { "Unlinked" },
                    tool,
                    if link { "into" } else { "from" },
                    agent,
                    agent_file.display()
                ))
            }
            WiringOutcome::Unchanged => Ok(format!(
                "No change: {} is {} {}",
                tool,
                if link { "already linked into" } else { "not linked into" },
                agent
            )),
            WiringOutcome::ManualEdit(instruction) => Ok(format!(
                "No edit applied to {}.\n{}",
                agent_file.display(),
                instruction
            )),
        }
    }

    fn handle_init(&self, force: bool) -> Result<String, InstallError> {
        let config_path = self.project_root.join(CONFIG_FILE);
        if config_path.exists() && !force {
            return Err(InstallError::ConfigError(format!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            )));
        }
        let config = ProjectConfig::default();
        let path = config.save(&self.project_root)?;

        let manifest_path = config.manifest_path(&self.project_root);
        if !manifest_path.exists() {
            if let Some(parent) = manifest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&manifest_path, "export {};\n")?;
        }
        Ok(format!(
            "Initialized project configuration: {}\nManifest: {}",
            path.display(),
            manifest_path.display()
        ))
    }

    fn interaction(&self, yes: bool) -> Box<dyn Interaction> {
        if yes || !std::io::stdin().is_terminal() {
            Box::new(NonInteractive)
        } else {
            Box::new(ConsoleInteraction)
        }
    }
}

/// Derive the tools-map key and exported symbol from a tool's component
/// name: `weather-tool` wires as `weather: weatherTool`.
fn tool_identifiers(tool_name: &str) -> (String, String) {
    let bare = tool_name.rsplit('/').next().unwrap_or(tool_name);
    let base = bare.strip_suffix("-tool").unwrap_or(bare);
    let key = camel_case(base);
    (key.clone(), format!("{}Tool", key))
}

/// Import specifier for an installed tool file, via the tools alias.
fn tool_import_path(config: &ProjectConfig, tool_file: &Path) -> String {
    let alias = config.alias_for(ComponentType::Tool);
    let stem = tool_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    format!("{}/{}", alias, stem)
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' || c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_identifiers() {
        assert_eq!(
            tool_identifiers("weather-tool"),
            ("weather".to_string(), "weatherTool".to_string())
        );
        assert_eq!(
            tool_identifiers("search"),
            ("search".to_string(), "searchTool".to_string())
        );
        assert_eq!(
            tool_identifiers("community/web-search-tool"),
            ("webSearch".to_string(), "webSearchTool".to_string())
        );
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("weather"), "weather");
        assert_eq!(camel_case("web-search"), "webSearch");
        assert_eq!(camel_case("a_b-c"), "aBC");
    }

    #[test]
    fn test_tool_import_path() {
        let config = ProjectConfig::default();
        assert_eq!(
            tool_import_path(&config, Path::new("src/tools/weather.ts")),
            "@/tools/weather"
        );
        assert_eq!(
            tool_import_path(&config, Path::new("src/tools/weather.community.ts")),
            "@/tools/weather.community"
        );
    }
}
