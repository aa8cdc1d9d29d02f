//! Registry client.
//!
//! Fetches index and component documents from a namespace's URL template.
//! The template must contain `{type}` and `{name}` placeholders; the index
//! URL replaces the whole `{type}/{name}.json` segment with `registry.json`.

use crate::config::ProjectConfig;
use crate::error::InstallError;
use crate::registry::{ComponentItem, RegistryIndex, RegistryIndexEntry};
use async_trait::async_trait;

/// Access to named registries. Implemented over HTTP in production and
/// in memory for tests.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch a namespace's index document.
    async fn fetch_index(&self, namespace: &str) -> Result<Vec<RegistryIndexEntry>, InstallError>;

    /// Fetch one component document. `type_dir` is the URL segment for the
    /// component type (`agents`, `tools`, ...).
    async fn fetch_item(
        &self,
        name: &str,
        type_dir: &str,
        namespace: &str,
        version: Option<&str>,
    ) -> Result<ComponentItem, InstallError>;
}

/// HTTP-backed registry client.
pub struct HttpRegistryClient {
    http: reqwest::Client,
    config: ProjectConfig,
}

impl HttpRegistryClient {
    pub fn new(config: ProjectConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn item_url(
        &self,
        namespace: &str,
        type_dir: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<String, InstallError> {
        let template = &self.config.registry(namespace)?.url;
        let mut url = template.replace("{type}", type_dir).replace("{name}", name);
        if let Some(v) = version {
            url.push_str(if url.contains('?') { "&" } else { "?" });
            url.push_str("version=");
            url.push_str(v);
        }
        Ok(url)
    }

    fn index_url(&self, namespace: &str) -> Result<String, InstallError> {
        let template = &self.config.registry(namespace)?.url;
        if template.contains("{type}/{name}.json") {
            Ok(template.replace("{type}/{name}.json", "registry.json"))
        } else {
            // Degenerate templates still get a usable index location.
            Ok(template
                .replace("{type}", "")
                .replace("{name}.json", "registry.json")
                .replace("//registry.json", "/registry.json"))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        namespace: &str,
        name: &str,
    ) -> Result<T, InstallError> {
        let response = self.http.get(url).send().await.map_err(|e| {
            InstallError::RegistryUnreachable {
                registry: namespace.to_string(),
                reason: e.to_string(),
            }
        })?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(InstallError::NotFound {
                registry: namespace.to_string(),
                name: name.to_string(),
            });
        }
        if !status.is_success() {
            return Err(InstallError::RegistryUnreachable {
                registry: namespace.to_string(),
                reason: format!("HTTP {} for {}", status, url),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| InstallError::RegistryUnreachable {
                registry: namespace.to_string(),
                reason: format!("Invalid registry document at {}: {}", url, e),
            })
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn fetch_index(&self, namespace: &str) -> Result<Vec<RegistryIndexEntry>, InstallError> {
        let url = self.index_url(namespace)?;
        tracing::debug!(namespace, url = %url, "fetching registry index");
        let index: RegistryIndex = self.get_json(&url, namespace, "registry.json").await?;
        Ok(index.items)
    }

    async fn fetch_item(
        &self,
        name: &str,
        type_dir: &str,
        namespace: &str,
        version: Option<&str>,
    ) -> Result<ComponentItem, InstallError> {
        let url = self.item_url(namespace, type_dir, name, version)?;
        tracing::debug!(namespace, name, url = %url, "fetching component");
        let mut item: ComponentItem = self.get_json(&url, namespace, name).await?;
        item.namespace = namespace.to_string();
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;

    fn client_with(url: &str) -> HttpRegistryClient {
        let mut config = ProjectConfig::default();
        config.registries.insert(
            "community".to_string(),
            RegistryConfig {
                url: url.to_string(),
                homepage: None,
                description: None,
            },
        );
        HttpRegistryClient::new(config)
    }

    #[test]
    fn test_item_url_substitution() {
        let client = client_with("https://example.com/r/{type}/{name}.json");
        let url = client
            .item_url("community", "tools", "weather-tool", None)
            .unwrap();
        assert_eq!(url, "https://example.com/r/tools/weather-tool.json");
    }

    #[test]
    fn test_item_url_with_version() {
        let client = client_with("https://example.com/r/{type}/{name}.json");
        let url = client
            .item_url("community", "tools", "weather-tool", Some("2.0.1"))
            .unwrap();
        assert_eq!(
            url,
            "https://example.com/r/tools/weather-tool.json?version=2.0.1"
        );
    }

    #[test]
    fn test_index_url_replaces_segment_wholesale() {
        let client = client_with("https://example.com/r/{type}/{name}.json");
        let url = client.index_url("community").unwrap();
        assert_eq!(url, "https://example.com/r/registry.json");
    }

    #[test]
    fn test_unknown_namespace_is_config_error() {
        let client = client_with("https://example.com/r/{type}/{name}.json");
        assert!(client.item_url("unknown", "tools", "x", None).is_err());
    }
}
