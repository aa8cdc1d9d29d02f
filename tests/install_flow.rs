//! End-to-end install pipeline tests against an in-memory catalog and a
//! temporary project tree.

use async_trait::async_trait;
use loadout::config::ProjectConfig;
use loadout::error::{Candidate, InstallError};
use loadout::install::materializer::WriteResult;
use loadout::install::Installer;
use loadout::interact::{Interaction, NonInteractive, SlotDecision};
use loadout::ledger::InstallLedger;
use loadout::registry::resolver::{resolve, ComponentFetcher};
use loadout::registry::{ComponentFile, ComponentItem};
use loadout::types::{ComponentType, NameSpec, DEFAULT_NAMESPACE};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tempfile::TempDir;

struct Catalog {
    items: HashMap<String, ComponentItem>,
}

impl Catalog {
    fn new(items: Vec<ComponentItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.name.clone(), i)).collect(),
        }
    }
}

#[async_trait]
impl ComponentFetcher for Catalog {
    async fn fetch(&self, spec: &NameSpec) -> Result<ComponentItem, InstallError> {
        self.items
            .get(&spec.name)
            .cloned()
            .ok_or_else(|| InstallError::NotFound {
                registry: spec.namespace_or_default().to_string(),
                name: spec.name.clone(),
            })
    }
}

fn component(
    name: &str,
    ty: ComponentType,
    slot: Option<&str>,
    deps: &[&str],
    files: Vec<(&str, &str)>,
) -> ComponentItem {
    ComponentItem {
        name: name.to_string(),
        component_type: ty,
        version: "1.0.0".to_string(),
        slot: slot.map(|s| s.to_string()),
        files: files
            .into_iter()
            .map(|(path, content)| ComponentFile {
                path: path.to_string(),
                content: content.to_string(),
            })
            .collect(),
        dependencies: Vec::new(),
        dev_dependencies: Vec::new(),
        registry_dependencies: deps.iter().map(|d| d.to_string()).collect(),
        env_vars: BTreeMap::new(),
        docs: None,
        namespace: DEFAULT_NAMESPACE.to_string(),
    }
}

fn specs(names: &[&str]) -> Vec<NameSpec> {
    names.iter().map(|n| NameSpec::parse(n).unwrap()).collect()
}

struct Project {
    dir: TempDir,
    config: ProjectConfig,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            config: ProjectConfig::default(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn install_with(
        &self,
        ledger: &mut InstallLedger,
        items: &[ComponentItem],
        interaction: &dyn Interaction,
        overwrite: bool,
    ) -> loadout::install::InstallReport {
        let mut installer = Installer {
            project_root: self.root(),
            config: &self.config,
            ledger,
            interaction,
            overwrite,
            skip_external: true,
        };
        installer.install(items).unwrap()
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root().join(rel)).unwrap()
    }

    fn manifest(&self) -> String {
        self.read("src/index.ts")
    }
}

/// Always chooses "replace" at slot conflicts.
struct ReplaceSlots;

impl Interaction for ReplaceSlots {
    fn select_candidate(
        &self,
        name: &str,
        candidates: &[Candidate],
    ) -> Result<usize, InstallError> {
        Err(InstallError::Ambiguous {
            name: name.to_string(),
            candidates: candidates.to_vec(),
        })
    }

    fn confirm_overwrite(&self, _path: &Path, _diff: &str) -> Result<bool, InstallError> {
        Ok(false)
    }

    fn resolve_slot_conflict(
        &self,
        _slot: &str,
        _existing: &str,
        _incoming: &str,
    ) -> Result<SlotDecision, InstallError> {
        Ok(SlotDecision::Replace)
    }
}

fn weather_catalog() -> Catalog {
    Catalog::new(vec![
        component(
            "weather-agent",
            ComponentType::Agent,
            None,
            &["weather-tool"],
            vec![(
                "weather-agent.ts",
                "import { weatherTool } from \"@loadout/tools/weather\";\n\nexport const weatherAgent = defineAgent({\n  name: \"weather\",\n  tools: {\n    weather: weatherTool,\n  },\n});\n",
            )],
        ),
        component(
            "weather-tool",
            ComponentType::Tool,
            None,
            &[],
            vec![("weather.ts", "export const weatherTool = {};\n")],
        ),
    ])
}

#[tokio::test]
async fn test_install_closure_files_manifest_and_ledger() {
    let catalog = weather_catalog();
    let resolved = resolve(&specs(&["weather-agent"]), &catalog).await.unwrap();
    let names: Vec<&str> = resolved.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["weather-tool", "weather-agent"]);

    let project = Project::new();
    let mut ledger = InstallLedger::load(project.root()).unwrap();
    let report = project.install_with(&mut ledger, &resolved, &NonInteractive, false);

    assert_eq!(report.components.len(), 2);
    assert!(project.root().join("src/tools/weather.ts").exists());
    assert!(project.root().join("src/agents/weather-agent.ts").exists());

    // Self-referential import rewritten to the project alias.
    let agent_source = project.read("src/agents/weather-agent.ts");
    assert!(agent_source.contains("from \"@/tools/weather\""));
    assert!(!agent_source.contains("@loadout/"));

    // Barrel references both singleton files, dependency first.
    let manifest = project.manifest();
    let tool_pos = manifest.find("./tools/weather.ts").unwrap();
    let agent_pos = manifest.find("./agents/weather-agent.ts").unwrap();
    assert!(tool_pos < agent_pos);

    // Ledger has both keys with hashes over the rewritten content.
    assert!(ledger.get("weather-tool").is_some());
    let agent_entry = ledger.get("weather-agent").unwrap();
    assert_eq!(
        agent_entry.hash,
        loadout::ledger::content_hash([agent_source.as_str()])
    );
}

#[tokio::test]
async fn test_reinstall_is_noop() {
    let catalog = weather_catalog();
    let resolved = resolve(&specs(&["weather-agent"]), &catalog).await.unwrap();

    let project = Project::new();
    let mut ledger = InstallLedger::load(project.root()).unwrap();
    project.install_with(&mut ledger, &resolved, &NonInteractive, false);
    let manifest_before = project.manifest();

    let second = project.install_with(&mut ledger, &resolved, &NonInteractive, false);
    for component in &second.components {
        for file in &component.files {
            assert_eq!(
                file.result,
                WriteResult::SkippedIdentical,
                "{} was rewritten on reinstall",
                file.target.display()
            );
        }
    }
    assert_eq!(project.manifest(), manifest_before);
}

#[tokio::test]
async fn test_local_edit_kept_by_default() {
    let catalog = weather_catalog();
    let resolved = resolve(&specs(&["weather-tool"]), &catalog).await.unwrap();

    let project = Project::new();
    let mut ledger = InstallLedger::load(project.root()).unwrap();
    project.install_with(&mut ledger, &resolved, &NonInteractive, false);

    let edited = "export const weatherTool = { units: \"metric\" };\n";
    std::fs::write(project.root().join("src/tools/weather.ts"), edited).unwrap();

    let report = project.install_with(&mut ledger, &resolved, &NonInteractive, false);
    assert_eq!(report.components[0].files[0].result, WriteResult::KeptLocal);
    assert_eq!(project.read("src/tools/weather.ts"), edited);
}

#[tokio::test]
async fn test_overwrite_flag_replaces_local_edit() {
    let catalog = weather_catalog();
    let resolved = resolve(&specs(&["weather-tool"]), &catalog).await.unwrap();

    let project = Project::new();
    let mut ledger = InstallLedger::load(project.root()).unwrap();
    project.install_with(&mut ledger, &resolved, &NonInteractive, false);

    std::fs::write(
        project.root().join("src/tools/weather.ts"),
        "local edit\n",
    )
    .unwrap();

    let report = project.install_with(&mut ledger, &resolved, &NonInteractive, true);
    assert_eq!(report.components[0].files[0].result, WriteResult::Written);
    assert_eq!(
        project.read("src/tools/weather.ts"),
        "export const weatherTool = {};\n"
    );
}

#[tokio::test]
async fn test_slot_replace_tears_down_previous_occupant() {
    let memory = component(
        "memory-storage",
        ComponentType::Storage,
        Some("storage"),
        &[],
        vec![("memory.ts", "export const memoryStorage = {};\n")],
    );
    let postgres = component(
        "postgres-storage",
        ComponentType::Storage,
        Some("storage"),
        &[],
        vec![("postgres.ts", "export const postgresStorage = {};\n")],
    );

    let project = Project::new();
    let mut ledger = InstallLedger::load(project.root()).unwrap();
    project.install_with(&mut ledger, &[memory], &NonInteractive, false);
    assert!(project.root().join("src/storage/memory.ts").exists());

    let report = project.install_with(&mut ledger, &[postgres], &ReplaceSlots, false);
    assert_eq!(
        report.components[0].replaced.as_deref(),
        Some("memory-storage")
    );
    assert!(!project.root().join("src/storage/memory.ts").exists());
    assert!(project.root().join("src/storage/postgres.ts").exists());
    assert!(ledger.get("memory-storage").is_none());
    let entry = ledger.get("postgres-storage").unwrap();
    assert_eq!(entry.slot.as_deref(), Some("storage"));
}

#[tokio::test]
async fn test_slot_conflict_non_interactive_keeps_both() {
    let memory = component(
        "memory-storage",
        ComponentType::Storage,
        Some("storage"),
        &[],
        vec![("memory.ts", "export const memoryStorage = {};\n")],
    );
    let postgres = component(
        "postgres-storage",
        ComponentType::Storage,
        Some("storage"),
        &[],
        vec![("postgres.ts", "export const postgresStorage = {};\n")],
    );

    let project = Project::new();
    let mut ledger = InstallLedger::load(project.root()).unwrap();
    project.install_with(&mut ledger, &[memory], &NonInteractive, false);
    project.install_with(&mut ledger, &[postgres], &NonInteractive, false);

    assert!(project.root().join("src/storage/memory.ts").exists());
    assert!(project.root().join("src/storage/postgres.ts").exists());
    assert!(ledger.get("memory-storage").is_some());
    assert!(ledger.get("postgres-storage").is_some());
}

#[tokio::test]
async fn test_remove_strips_files_manifest_and_ledger() {
    let catalog = weather_catalog();
    let resolved = resolve(&specs(&["weather-agent"]), &catalog).await.unwrap();

    let project = Project::new();
    let mut ledger = InstallLedger::load(project.root()).unwrap();
    project.install_with(&mut ledger, &resolved, &NonInteractive, false);

    let mut installer = Installer {
        project_root: project.root(),
        config: &project.config,
        ledger: &mut ledger,
        interaction: &NonInteractive,
        overwrite: false,
        skip_external: true,
    };
    let report = installer.uninstall("weather-agent").unwrap();
    assert_eq!(report.key, "weather-agent");

    assert!(!project.root().join("src/agents/weather-agent.ts").exists());
    assert!(project.root().join("src/tools/weather.ts").exists());
    let manifest = project.manifest();
    assert!(!manifest.contains("./agents/weather-agent.ts"));
    assert!(manifest.contains("./tools/weather.ts"));
    assert!(ledger.get("weather-agent").is_none());
    assert!(ledger.get("weather-tool").is_some());
}

#[tokio::test]
async fn test_package_preserves_directory_structure() {
    let package = component(
        "chat-ui",
        ComponentType::Package,
        None,
        &[],
        vec![
            ("chat-ui/index.ts", "export {};\n"),
            ("chat-ui/components/window.tsx", "export const Window = null;\n"),
        ],
    );

    let project = Project::new();
    let mut ledger = InstallLedger::load(project.root()).unwrap();
    project.install_with(&mut ledger, &[package], &NonInteractive, false);

    assert!(project.root().join("src/packages/chat-ui/index.ts").exists());
    assert!(project
        .root()
        .join("src/packages/chat-ui/components/window.tsx")
        .exists());
    // Packages never touch the barrel.
    assert!(!project.root().join("src/index.ts").exists());
}

#[tokio::test]
async fn test_ledger_persists_across_runs() {
    let catalog = weather_catalog();
    let resolved = resolve(&specs(&["weather-tool"]), &catalog).await.unwrap();

    let project = Project::new();
    {
        let mut ledger = InstallLedger::load(project.root()).unwrap();
        project.install_with(&mut ledger, &resolved, &NonInteractive, false);
    }
    let reloaded = InstallLedger::load(project.root()).unwrap();
    let entry = reloaded.get("weather-tool").unwrap();
    assert_eq!(entry.version, "1.0.0");
    assert_eq!(entry.files, vec![std::path::PathBuf::from("src/tools/weather.ts")]);
}
