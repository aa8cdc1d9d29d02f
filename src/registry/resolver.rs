//! Dependency resolution.
//!
//! Expands the requested names into a deduplicated, dependency-closed,
//! dependency-first ordered list of component items. Any name that cannot be
//! fetched aborts the whole resolution; no partial set is ever acted upon.

use crate::error::InstallError;
use crate::registry::client::RegistryClient;
use crate::registry::ComponentItem;
use crate::types::{ComponentKey, ComponentType, NameSpec};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};

/// Fetches one component by parsed name spec. Injected into `resolve` so
/// tests run against an in-memory catalog.
#[async_trait]
pub trait ComponentFetcher: Send + Sync {
    async fn fetch(&self, spec: &NameSpec) -> Result<ComponentItem, InstallError>;
}

/// Breadth-first closure over `registryDependencies`.
///
/// A bare dependency name resolves in the namespace of the item that
/// declares it, so registries may reference their own components without
/// qualification. The visited set keys on (namespace, name), which both
/// deduplicates and terminates cycles.
pub async fn resolve(
    requests: &[NameSpec],
    fetcher: &dyn ComponentFetcher,
) -> Result<Vec<ComponentItem>, InstallError> {
    let mut queue: VecDeque<NameSpec> = requests.iter().cloned().collect();
    let mut visited: HashSet<ComponentKey> = HashSet::new();
    let mut items: Vec<ComponentItem> = Vec::new();

    while let Some(spec) = queue.pop_front() {
        if !visited.insert(spec.key()) {
            continue;
        }
        let item = fetcher.fetch(&spec).await?;
        for dep in &item.registry_dependencies {
            let mut dep_spec = NameSpec::parse(dep)?;
            if dep_spec.namespace.is_none() {
                dep_spec.namespace = Some(item.namespace.clone());
            }
            if !visited.contains(&dep_spec.key()) {
                queue.push_back(dep_spec);
            }
        }
        items.push(item);
    }

    Ok(order_dependency_first(items))
}

/// Reorder a closed set so every dependency appears at or before the items
/// that declare it. Stable with respect to fetch order; cycles fall back to
/// first-visit order.
fn order_dependency_first(items: Vec<ComponentItem>) -> Vec<ComponentItem> {
    let index_of: HashMap<ComponentKey, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (item.key(), i))
        .collect();

    let mut emitted = vec![false; items.len()];
    let mut order: Vec<usize> = Vec::with_capacity(items.len());

    fn visit(
        i: usize,
        items: &[ComponentItem],
        index_of: &HashMap<ComponentKey, usize>,
        emitted: &mut [bool],
        in_progress: &mut HashSet<usize>,
        order: &mut Vec<usize>,
    ) {
        if emitted[i] || !in_progress.insert(i) {
            return;
        }
        for dep in &items[i].registry_dependencies {
            let dep_key = match NameSpec::parse(dep) {
                Ok(mut spec) => {
                    if spec.namespace.is_none() {
                        spec.namespace = Some(items[i].namespace.clone());
                    }
                    spec.key()
                }
                Err(_) => continue,
            };
            if let Some(&j) = index_of.get(&dep_key) {
                visit(j, items, index_of, emitted, in_progress, order);
            }
        }
        in_progress.remove(&i);
        emitted[i] = true;
        order.push(i);
    }

    let mut in_progress = HashSet::new();
    for i in 0..items.len() {
        visit(i, &items, &index_of, &mut emitted, &mut in_progress, &mut order);
    }

    let mut slots: Vec<Option<ComponentItem>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

/// Production fetcher: resolves a name's type (pinned from disambiguation,
/// or first index match for transitive dependencies) and delegates to the
/// registry client.
pub struct RegistryFetcher<'a> {
    client: &'a dyn RegistryClient,
    pinned_types: HashMap<ComponentKey, ComponentType>,
    index_types: tokio::sync::Mutex<HashMap<String, HashMap<String, ComponentType>>>,
}

impl<'a> RegistryFetcher<'a> {
    pub fn new(
        client: &'a dyn RegistryClient,
        pinned_types: HashMap<ComponentKey, ComponentType>,
    ) -> Self {
        Self {
            client,
            pinned_types,
            index_types: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    async fn type_of(&self, spec: &NameSpec) -> Result<ComponentType, InstallError> {
        if let Some(ty) = self.pinned_types.get(&spec.key()) {
            return Ok(*ty);
        }
        let namespace = spec.namespace_or_default().to_string();
        let mut cache = self.index_types.lock().await;
        if !cache.contains_key(&namespace) {
            let entries = self.client.fetch_index(&namespace).await?;
            let mut types = HashMap::new();
            for entry in entries {
                // First match wins for duplicate names.
                types.entry(entry.name).or_insert(entry.component_type);
            }
            cache.insert(namespace.clone(), types);
        }
        cache
            .get(&namespace)
            .and_then(|types| types.get(&spec.name))
            .copied()
            .ok_or_else(|| InstallError::NotFound {
                registry: namespace,
                name: spec.name.clone(),
            })
    }
}

#[async_trait]
impl<'a> ComponentFetcher for RegistryFetcher<'a> {
    async fn fetch(&self, spec: &NameSpec) -> Result<ComponentItem, InstallError> {
        let component_type = self.type_of(spec).await?;
        self.client
            .fetch_item(
                &spec.name,
                component_type.type_dir(),
                spec.namespace_or_default(),
                spec.version.as_deref(),
            )
            .await
    }
}
