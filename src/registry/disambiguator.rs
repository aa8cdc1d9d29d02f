//! Requested-name disambiguation.
//!
//! A requested name may match several registry entries (same name, different
//! types, or substring matches across namespaces). Explicit requests are
//! resolved to exactly one (namespace, name, type) before dependency
//! resolution begins; transitive dependencies stay first-match.

use crate::config::ProjectConfig;
use crate::error::{Candidate, InstallError};
use crate::interact::Interaction;
use crate::registry::client::RegistryClient;
use crate::registry::RegistryIndexEntry;
use crate::types::{ComponentKey, ComponentType, NameSpec};
use std::collections::HashMap;

/// Result of disambiguating the explicit request list: possibly corrected
/// name specs plus a type pin per resolved key, consumed by the resolver.
#[derive(Debug, Clone, Default)]
pub struct Disambiguation {
    pub requests: Vec<NameSpec>,
    pub pinned_types: HashMap<ComponentKey, ComponentType>,
}

pub struct Disambiguator<'a> {
    client: &'a dyn RegistryClient,
    config: &'a ProjectConfig,
    interaction: &'a dyn Interaction,
    /// Index cache per namespace; `None` marks an unreachable namespace so
    /// it is only tried once per run.
    indexes: HashMap<String, Option<Vec<RegistryIndexEntry>>>,
}

impl<'a> Disambiguator<'a> {
    pub fn new(
        client: &'a dyn RegistryClient,
        config: &'a ProjectConfig,
        interaction: &'a dyn Interaction,
    ) -> Self {
        Self {
            client,
            config,
            interaction,
            indexes: HashMap::new(),
        }
    }

    /// Resolve every explicitly requested name to at most one candidate.
    ///
    /// Names with no match anywhere are passed through untouched; the
    /// resolver raises its standard not-found error for them.
    pub async fn disambiguate(
        &mut self,
        specs: &[NameSpec],
        type_filter: Option<ComponentType>,
    ) -> Result<Disambiguation, InstallError> {
        let mut out = Disambiguation::default();
        for spec in specs {
            let resolved = self.disambiguate_one(spec, type_filter).await?;
            out.requests.push(resolved.0);
            if let Some((key, ty)) = resolved.1 {
                out.pinned_types.insert(key, ty);
            }
        }
        Ok(out)
    }

    async fn disambiguate_one(
        &mut self,
        spec: &NameSpec,
        type_filter: Option<ComponentType>,
    ) -> Result<(NameSpec, Option<(ComponentKey, ComponentType)>), InstallError> {
        let namespace = spec.namespace_or_default().to_string();

        let exact = self
            .candidates_in(&namespace, &spec.name, type_filter, MatchMode::Exact)
            .await;
        match exact.len() {
            1 => {
                let c = &exact[0];
                return Ok((
                    spec.clone(),
                    Some((
                        ComponentKey::new(c.namespace.clone(), c.name.clone()),
                        c.component_type,
                    )),
                ));
            }
            0 => {}
            _ => {
                let choice = self.interaction.select_candidate(&spec.name, &exact)?;
                let c = &exact[choice];
                return Ok((
                    spec.clone(),
                    Some((
                        ComponentKey::new(c.namespace.clone(), c.name.clone()),
                        c.component_type,
                    )),
                ));
            }
        }

        // Fall back to substring search. An explicit namespace restricts the
        // scan; otherwise every configured namespace is consulted, skipping
        // the ones that cannot be reached.
        let scan_namespaces: Vec<String> = if spec.namespace.is_some() {
            vec![namespace]
        } else {
            self.config.registries.keys().cloned().collect()
        };
        self.prefetch_indexes(&scan_namespaces).await;
        let mut fuzzy = Vec::new();
        for ns in &scan_namespaces {
            fuzzy.extend(
                self.candidates_in(ns, &spec.name, type_filter, MatchMode::Substring)
                    .await,
            );
        }
        fuzzy.sort_by(|a, b| {
            (&a.namespace, &a.name, a.component_type.as_str())
                .cmp(&(&b.namespace, &b.name, b.component_type.as_str()))
        });

        match fuzzy.len() {
            // Not found here; the resolver owns that error.
            0 => Ok((spec.clone(), None)),
            1 => {
                let c = &fuzzy[0];
                tracing::info!(
                    requested = %spec.name,
                    matched = %format!("{}/{}", c.namespace, c.name),
                    "auto-selected unique fuzzy match"
                );
                let corrected = NameSpec {
                    namespace: Some(c.namespace.clone()),
                    name: c.name.clone(),
                    version: spec.version.clone(),
                };
                Ok((
                    corrected,
                    Some((
                        ComponentKey::new(c.namespace.clone(), c.name.clone()),
                        c.component_type,
                    )),
                ))
            }
            _ => {
                let choice = self.interaction.select_candidate(&spec.name, &fuzzy)?;
                let c = &fuzzy[choice];
                let corrected = NameSpec {
                    namespace: Some(c.namespace.clone()),
                    name: c.name.clone(),
                    version: spec.version.clone(),
                };
                Ok((
                    corrected,
                    Some((
                        ComponentKey::new(c.namespace.clone(), c.name.clone()),
                        c.component_type,
                    )),
                ))
            }
        }
    }

    async fn candidates_in(
        &mut self,
        namespace: &str,
        name: &str,
        type_filter: Option<ComponentType>,
        mode: MatchMode,
    ) -> Vec<Candidate> {
        let Some(entries) = self.index(namespace).await else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|e| match mode {
                MatchMode::Exact => e.name == name,
                MatchMode::Substring => e.name.contains(name),
            })
            .filter(|e| type_filter.map_or(true, |t| e.component_type == t))
            .map(|e| Candidate {
                namespace: namespace.to_string(),
                name: e.name.clone(),
                component_type: e.component_type,
            })
            .collect()
    }

    /// Fetch every not-yet-cached index in one concurrent batch, so a
    /// multi-namespace scan pays one round trip instead of one per registry.
    async fn prefetch_indexes(&mut self, namespaces: &[String]) {
        let missing: Vec<&String> = namespaces
            .iter()
            .filter(|ns| !self.indexes.contains_key(ns.as_str()))
            .collect();
        if missing.is_empty() {
            return;
        }
        let client = self.client;
        let fetches = missing.iter().map(|ns| client.fetch_index(ns));
        let results = futures::future::join_all(fetches).await;
        for (ns, result) in missing.into_iter().zip(results) {
            let fetched = match result {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!(namespace = %ns, error = %e, "skipping unreachable namespace during scan");
                    None
                }
            };
            self.indexes.insert(ns.clone(), fetched);
        }
    }

    /// Fetch and cache a namespace's index. Unreachable namespaces are
    /// recorded and skipped rather than aborting the scan.
    async fn index(&mut self, namespace: &str) -> Option<&Vec<RegistryIndexEntry>> {
        if !self.indexes.contains_key(namespace) {
            let fetched = match self.client.fetch_index(namespace).await {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!(namespace, error = %e, "skipping unreachable namespace during scan");
                    None
                }
            };
            self.indexes.insert(namespace.to_string(), fetched);
        }
        self.indexes.get(namespace).and_then(|v| v.as_ref())
    }
}

#[derive(Clone, Copy)]
enum MatchMode {
    Exact,
    Substring,
}
