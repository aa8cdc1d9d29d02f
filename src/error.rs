//! Error taxonomy for the install engine.
//!
//! Resolution-phase errors (`NotFound`, `Ambiguous`, `RegistryUnreachable`)
//! abort before any file is written. Materialization-phase issues (file
//! conflicts, text-transform failures) are handled per item and never
//! surface through this enum; they degrade to statuses and warnings.

use std::fmt;
use thiserror::Error;

/// A possible match for an ambiguous requested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub namespace: String,
    pub name: String,
    pub component_type: crate::types::ComponentType,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.namespace, self.name, self.component_type)
    }
}

#[derive(Error, Debug)]
pub enum InstallError {
    /// Requested or transitively-required name absent from all reachable
    /// registries. Fatal; aborts the whole resolution.
    #[error("Component not found in registry '{registry}': {name}")]
    NotFound { registry: String, name: String },

    /// A requested name maps to more than one candidate and no interactive
    /// choice is possible.
    #[error("Ambiguous component name '{name}'; candidates: {}", format_candidates(.candidates))]
    Ambiguous {
        name: String,
        candidates: Vec<Candidate>,
    },

    /// A namespace's index or item fetch failed. Fatal for explicitly
    /// required names; skipped during multi-namespace candidate scans.
    #[error("Registry '{registry}' unreachable: {reason}")]
    RegistryUnreachable { registry: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Ledger error: {0}")]
    LedgerError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn format_candidates(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentType;

    #[test]
    fn test_ambiguous_error_enumerates_candidates() {
        let err = InstallError::Ambiguous {
            name: "a".to_string(),
            candidates: vec![
                Candidate {
                    namespace: "default".to_string(),
                    name: "a".to_string(),
                    component_type: ComponentType::Tool,
                },
                Candidate {
                    namespace: "default".to_string(),
                    name: "a".to_string(),
                    component_type: ComponentType::Agent,
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("default/a (tool)"));
        assert!(message.contains("default/a (agent)"));
    }

    #[test]
    fn test_not_found_names_registry_and_component() {
        let err = InstallError::NotFound {
            registry: "community".to_string(),
            name: "missing-tool".to_string(),
        };
        assert!(err.to_string().contains("community"));
        assert!(err.to_string().contains("missing-tool"));
    }
}
