//! Registry data model and access.
//!
//! Wire types mirror the JSON documents served by a registry: a per-namespace
//! index (`registry.json`) and one document per component. Fetched items are
//! immutable; the install pipeline only consumes them.

pub mod client;
pub mod disambiguator;
pub mod resolver;

use crate::types::{ComponentKey, ComponentType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in a namespace's index document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryIndexEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub registry_dependencies: Vec<String>,
}

/// One file of a fetched component document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFile {
    pub path: String,
    pub content: String,
}

/// A fully fetched component document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentItem {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default)]
    pub version: String,
    /// Exclusive functional role this component occupies, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    pub files: Vec<ComponentFile>,
    /// External package names forwarded to the package manager.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub dev_dependencies: Vec<String>,
    /// Names of other registry components this one requires.
    #[serde(default)]
    pub registry_dependencies: Vec<String>,
    /// Environment variables the user must provide, name to description.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,

    /// Namespace the item was fetched from. Not part of the wire format;
    /// stamped by the fetcher.
    #[serde(skip)]
    pub namespace: String,
}

impl ComponentItem {
    pub fn key(&self) -> ComponentKey {
        ComponentKey::new(self.namespace.clone(), self.name.clone())
    }
}

/// Index document wrapper: `{ "items": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryIndex {
    pub items: Vec<RegistryIndexEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_item_wire_format() {
        let json = r#"{
            "name": "weather-tool",
            "type": "tool",
            "version": "1.0.0",
            "files": [{"path": "weather.ts", "content": "export const weatherTool = {};"}],
            "dependencies": ["zod"],
            "devDependencies": [],
            "registryDependencies": ["geo-skill"],
            "envVars": {"WEATHER_API_KEY": "API key for the weather provider"}
        }"#;
        let item: ComponentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.component_type, crate::types::ComponentType::Tool);
        assert_eq!(item.registry_dependencies, vec!["geo-skill"]);
        assert_eq!(item.dependencies, vec!["zod"]);
        assert!(item.env_vars.contains_key("WEATHER_API_KEY"));
        assert!(item.slot.is_none());
    }

    #[test]
    fn test_index_wire_format() {
        let json = r#"{"items": [
            {"name": "weather-agent", "type": "agent", "description": "", "registryDependencies": ["weather-tool"]},
            {"name": "weather-tool", "type": "tool"}
        ]}"#;
        let index: RegistryIndex = serde_json::from_str(json).unwrap();
        assert_eq!(index.items.len(), 2);
        assert_eq!(
            index.items[0].registry_dependencies,
            vec!["weather-tool".to_string()]
        );
        assert!(index.items[1].registry_dependencies.is_empty());
    }
}
