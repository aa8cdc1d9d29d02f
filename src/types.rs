//! Shared component identity types.

use crate::error::InstallError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace used when a requested name carries no explicit registry prefix.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Kind of installable component.
///
/// Every kind except `Package` installs each file entry directly under the
/// alias directory for the kind; `Package` preserves relative directory
/// structure under its base directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Agent,
    Tool,
    Skill,
    Storage,
    Cron,
    Package,
}

impl ComponentType {
    /// Directory segment used in registry URL templates (`{type}`).
    pub fn type_dir(&self) -> &'static str {
        match self {
            ComponentType::Agent => "agents",
            ComponentType::Tool => "tools",
            ComponentType::Skill => "skills",
            ComponentType::Storage => "storage",
            ComponentType::Cron => "crons",
            ComponentType::Package => "packages",
        }
    }

    /// Singleton component kinds aggregate into the barrel manifest.
    pub fn in_barrel(&self) -> bool {
        matches!(
            self,
            ComponentType::Agent | ComponentType::Tool | ComponentType::Skill
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Agent => "agent",
            ComponentType::Tool => "tool",
            ComponentType::Skill => "skill",
            ComponentType::Storage => "storage",
            ComponentType::Cron => "cron",
            ComponentType::Package => "package",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(ComponentType::Agent),
            "tool" => Ok(ComponentType::Tool),
            "skill" => Ok(ComponentType::Skill),
            "storage" => Ok(ComponentType::Storage),
            "cron" => Ok(ComponentType::Cron),
            "package" => Ok(ComponentType::Package),
            other => Err(InstallError::ConfigError(format!(
                "Unknown component type: {}",
                other
            ))),
        }
    }
}

/// Stable identity of a component within a project: namespace plus name.
///
/// Displayed as `namespace/name`, or bare `name` for the default namespace.
/// This display form is also the install-ledger key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey {
    pub namespace: String,
    pub name: String,
}

impl ComponentKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }

    /// Ledger key form: `namespace/name`, bare `name` for the default namespace.
    pub fn ledger_key(&self) -> String {
        if self.is_default_namespace() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ledger_key())
    }
}

/// A requested component name as typed on the command line:
/// `[namespace/]name[@version]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameSpec {
    pub namespace: Option<String>,
    pub name: String,
    pub version: Option<String>,
}

impl NameSpec {
    pub fn parse(raw: &str) -> Result<Self, InstallError> {
        let (path, version) = match raw.rsplit_once('@') {
            Some((p, v)) if !p.is_empty() => (p, Some(v.to_string())),
            _ => (raw, None),
        };
        let (namespace, name) = match path.split_once('/') {
            Some((ns, n)) => (Some(ns.to_string()), n.to_string()),
            None => (None, path.to_string()),
        };
        if name.is_empty() {
            return Err(InstallError::ConfigError(format!(
                "Invalid component name: '{}'",
                raw
            )));
        }
        Ok(Self {
            namespace,
            name,
            version,
        })
    }

    /// Namespace to resolve against, falling back to the default.
    pub fn namespace_or_default(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn key(&self) -> ComponentKey {
        ComponentKey::new(self.namespace_or_default(), self.name.clone())
    }
}

impl fmt::Display for NameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{}/", ns)?;
        }
        f.write_str(&self.name)?;
        if let Some(v) = &self.version {
            write!(f, "@{}", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let spec = NameSpec::parse("weather-agent").unwrap();
        assert_eq!(spec.name, "weather-agent");
        assert_eq!(spec.namespace, None);
        assert_eq!(spec.version, None);
        assert_eq!(spec.namespace_or_default(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_parse_namespaced_versioned() {
        let spec = NameSpec::parse("community/weather-agent@1.2.0").unwrap();
        assert_eq!(spec.namespace.as_deref(), Some("community"));
        assert_eq!(spec.name, "weather-agent");
        assert_eq!(spec.version.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn test_parse_empty_name_rejected() {
        assert!(NameSpec::parse("community/").is_err());
    }

    #[test]
    fn test_ledger_key_forms() {
        let default = ComponentKey::new(DEFAULT_NAMESPACE, "weather-tool");
        assert_eq!(default.ledger_key(), "weather-tool");
        let scoped = ComponentKey::new("community", "weather-tool");
        assert_eq!(scoped.ledger_key(), "community/weather-tool");
    }

    #[test]
    fn test_component_type_round_trip() {
        for s in ["agent", "tool", "skill", "storage", "cron", "package"] {
            let ty: ComponentType = s.parse().unwrap();
            assert_eq!(ty.as_str(), s);
        }
        assert!("widget".parse::<ComponentType>().is_err());
    }

    #[test]
    fn test_barrel_membership() {
        assert!(ComponentType::Agent.in_barrel());
        assert!(ComponentType::Tool.in_barrel());
        assert!(!ComponentType::Storage.in_barrel());
        assert!(!ComponentType::Package.in_barrel());
    }
}
