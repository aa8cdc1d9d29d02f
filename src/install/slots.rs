//! Slot conflict detection.
//!
//! A slot models an exclusive functional role (e.g. "the storage backend").
//! Installing a second filler is almost always meant to replace the first,
//! but the user may explicitly keep both, so a match is a decision point
//! rather than an error.

use crate::ledger::{InstallLedger, LedgerEntry};

/// An already-installed component occupying the same slot as an incoming one.
#[derive(Debug, Clone)]
pub struct SlotConflict {
    pub key: String,
    pub entry: LedgerEntry,
}

/// Find an installed component (other than `own_key`) occupying `slot`.
pub fn find_conflict(ledger: &InstallLedger, own_key: &str, slot: &str) -> Option<SlotConflict> {
    ledger
        .entries()
        .find(|(key, entry)| key.as_str() != own_key && entry.slot.as_deref() == Some(slot))
        .map(|(key, entry)| SlotConflict {
            key: key.clone(),
            entry: entry.clone(),
        })
}
