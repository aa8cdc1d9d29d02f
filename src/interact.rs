//! Interactive decision points.
//!
//! Disambiguation, per-file overwrite, and slot conflicts are synchronous
//! blocking prompts. The `Interaction` trait keeps the install pipeline
//! testable and gives non-interactive contexts a deterministic behavior:
//! ambiguity fails with an enumerated candidate list, file conflicts keep
//! the local copy, slot conflicts default to no teardown.

use crate::error::{Candidate, InstallError};
use std::path::Path;

/// Outcome of a slot conflict decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDecision {
    /// Tear down the previously installed occupant, then install.
    Replace,
    /// Install alongside the existing occupant.
    Add,
}

pub trait Interaction: Send + Sync {
    /// Pick one candidate for an ambiguous name. Returns an index into
    /// `candidates`.
    fn select_candidate(
        &self,
        name: &str,
        candidates: &[Candidate],
    ) -> Result<usize, InstallError>;

    /// Decide whether to overwrite a locally different file. `diff` is a
    /// rendered old-vs-new comparison.
    fn confirm_overwrite(&self, path: &Path, diff: &str) -> Result<bool, InstallError>;

    /// Decide what to do when a new component occupies an already-filled slot.
    fn resolve_slot_conflict(
        &self,
        slot: &str,
        existing: &str,
        incoming: &str,
    ) -> Result<SlotDecision, InstallError>;
}

/// Terminal prompts via dialoguer.
pub struct ConsoleInteraction;

impl Interaction for ConsoleInteraction {
    fn select_candidate(
        &self,
        name: &str,
        candidates: &[Candidate],
    ) -> Result<usize, InstallError> {
        use dialoguer::Select;

        let labels: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
        Select::new()
            .with_prompt(format!("Multiple components match '{}'", name))
            .items(&labels)
            .default(0)
            .interact()
            .map_err(|e| InstallError::ConfigError(format!("Failed to get user input: {}", e)))
    }

    fn confirm_overwrite(&self, path: &Path, diff: &str) -> Result<bool, InstallError> {
        use dialoguer::Confirm;

        println!("{}", diff);
        Confirm::new()
            .with_prompt(format!("Overwrite {}?", path.display()))
            .default(false)
            .interact()
            .map_err(|e| InstallError::ConfigError(format!("Failed to get user input: {}", e)))
    }

    fn resolve_slot_conflict(
        &self,
        slot: &str,
        existing: &str,
        incoming: &str,
    ) -> Result<SlotDecision, InstallError> {
        use dialoguer::Select;

        let choice = Select::new()
            .with_prompt(format!(
                "Slot '{}' is occupied by '{}'; installing '{}'",
                slot, existing, incoming
            ))
            .items(&[
                format!("Replace {} (remove its files)", existing),
                "Add alongside (keep both)".to_string(),
            ])
            .default(0)
            .interact()
            .map_err(|e| InstallError::ConfigError(format!("Failed to get user input: {}", e)))?;
        Ok(match choice {
            0 => SlotDecision::Replace,
            _ => SlotDecision::Add,
        })
    }
}

/// Deterministic behavior for non-interactive runs.
pub struct NonInteractive;

impl Interaction for NonInteractive {
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

    fn confirm_overwrite(&self, path: &Path, _diff: &str) -> Result<bool, InstallError> {
        tracing::warn!(path = %path.display(), "file differs locally; keeping local copy");
        Ok(false)
    }

    fn resolve_slot_conflict(
        &self,
        slot: &str,
        existing: &str,
        incoming: &str,
    ) -> Result<SlotDecision, InstallError> {
        tracing::warn!(
            slot,
            existing,
            incoming,
            "slot conflict in non-interactive mode; keeping both components"
        );
        Ok(SlotDecision::Add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentType;

    #[test]
    fn test_non_interactive_ambiguity_is_fatal() {
        let candidates = vec![Candidate {
            namespace: "default".to_string(),
            name: "a".to_string(),
            component_type: ComponentType::Tool,
        }];
        let err = NonInteractive
            .select_candidate("a", &candidates)
            .unwrap_err();
        assert!(matches!(err, InstallError::Ambiguous { .. }));
    }

    #[test]
    fn test_non_interactive_keeps_local_files() {
        let keep = NonInteractive
            .confirm_overwrite(Path::new("src/tools/weather.ts"), "")
            .unwrap();
        assert!(!keep);
    }

    #[test]
    fn test_non_interactive_slot_conflict_adds() {
        let decision = NonInteractive
            .resolve_slot_conflict("storage", "memory-storage", "postgres-storage")
            .unwrap();
        assert_eq!(decision, SlotDecision::Add);
    }
}
