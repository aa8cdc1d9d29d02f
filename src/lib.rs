//! Loadout: Registry-Based Component Installer
//!
//! Installs reusable source-code components (agents, tools, skills, storage
//! adapters, crons, multi-file packages) from named registries into a
//! consumer project as editable source files. The engine resolves transitive
//! registry dependencies, disambiguates requested names, detects exclusive
//! slot conflicts, diffs each file against the project tree, maintains the
//! barrel manifest, and records everything in a durable install ledger so
//! repeated runs are no-ops.

pub mod config;
pub mod error;
pub mod install;
pub mod interact;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod report;
pub mod tooling;
pub mod transform;
pub mod types;
