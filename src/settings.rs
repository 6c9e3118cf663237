/*!
 * Settings documents: client identifier and the two labeled links
 *
 * Both documents are pretty-printed JSON in the data directory. Reads never
 * fail: a missing or malformed document yields empty fields. Writes replace
 * the whole document.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::Result;

pub const CLIENT_CONFIG_FILE: &str = "client-config.json";
pub const LINKS_CONFIG_FILE: &str = "links-config.json";

/// Document holding the application client identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub client_id: Option<String>,
}

/// Document holding the two alternating external links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinksConfig {
    pub steam_label: Option<String>,
    pub steam_url: Option<String>,
    pub site_label: Option<String>,
    pub site_url: Option<String>,
}

/// Everything the session needs to start, each field independently optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub client_id: Option<String>,
    pub steam_label: Option<String>,
    pub steam_url: Option<String>,
    pub site_label: Option<String>,
    pub site_url: Option<String>,
}

/// Credentials with every field present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub client_id: String,
    pub steam_label: String,
    pub steam_url: String,
    pub site_label: String,
    pub site_url: String,
}

impl SessionCredentials {
    /// All fields present, or `None` if any is missing
    pub fn resolve(&self) -> Option<ResolvedCredentials> {
        Some(ResolvedCredentials {
            client_id: self.client_id.clone()?,
            steam_label: self.steam_label.clone()?,
            steam_url: self.steam_url.clone()?,
            site_label: self.site_label.clone()?,
            site_url: self.site_url.clone()?,
        })
    }

    /// Names of the fields that are still missing
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("clientId", &self.client_id),
            ("steamLabel", &self.steam_label),
            ("steamUrl", &self.steam_url),
            ("siteLabel", &self.site_label),
            ("siteUrl", &self.site_url),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Trim, mapping empty results to `None`
pub fn normalize(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// String field of a parsed document; non-strings count as absent
fn string_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).and_then(normalize)
}

/// Reads and writes the two settings documents
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn client_config_path(&self) -> PathBuf {
        self.dir.join(CLIENT_CONFIG_FILE)
    }

    pub fn links_config_path(&self) -> PathBuf {
        self.dir.join(LINKS_CONFIG_FILE)
    }

    async fn read_document(path: &Path) -> Value {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("settings document {} unreadable: {}", path.display(), e);
                return Value::Null;
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!("settings document {} malformed: {}", path.display(), e);
            Value::Null
        })
    }

    async fn write_document<T: Serialize>(&self, path: &Path, doc: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let contents = serde_json::to_string_pretty(doc)?;
        fs::write(path, contents).await?;
        Ok(())
    }

    pub async fn read_client_config(&self) -> ClientConfig {
        let doc = Self::read_document(&self.client_config_path()).await;
        ClientConfig {
            client_id: string_field(&doc, "clientId"),
        }
    }

    pub async fn read_links_config(&self) -> LinksConfig {
        let doc = Self::read_document(&self.links_config_path()).await;
        LinksConfig {
            steam_label: string_field(&doc, "steamLabel"),
            steam_url: string_field(&doc, "steamUrl"),
            site_label: string_field(&doc, "siteLabel"),
            site_url: string_field(&doc, "siteUrl"),
        }
    }

    /// Both documents merged; never fails
    pub async fn read_credentials(&self) -> SessionCredentials {
        let client = self.read_client_config().await;
        let links = self.read_links_config().await;
        SessionCredentials {
            client_id: client.client_id,
            steam_label: links.steam_label,
            steam_url: links.steam_url,
            site_label: links.site_label,
            site_url: links.site_url,
        }
    }

    pub async fn write_client_id(&self, client_id: &str) -> Result<()> {
        let doc = ClientConfig {
            client_id: normalize(client_id),
        };
        self.write_document(&self.client_config_path(), &doc).await
    }

    pub async fn write_links(
        &self,
        steam_label: &str,
        steam_url: &str,
        site_label: &str,
        site_url: &str,
    ) -> Result<()> {
        let doc = LinksConfig {
            steam_label: normalize(steam_label),
            steam_url: normalize(steam_url),
            site_label: normalize(site_label),
            site_url: normalize(site_url),
        };
        self.write_document(&self.links_config_path(), &doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_documents_yield_empty_credentials() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());

        let creds = store.read_credentials().await;
        assert_eq!(creds, SessionCredentials::default());
        assert!(creds.resolve().is_none());
        assert_eq!(creds.missing_fields().len(), 5);
    }

    #[tokio::test]
    async fn test_malformed_document_is_empty() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        std::fs::write(store.client_config_path(), "{ not json").unwrap();

        assert_eq!(store.read_client_config().await.client_id, None);
    }

    #[tokio::test]
    async fn test_non_string_fields_are_ignored() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        std::fs::write(
            store.links_config_path(),
            r#"{"steamLabel": 42, "steamUrl": "  https://store.example  ", "siteLabel": null}"#,
        )
        .unwrap();

        let links = store.read_links_config().await;
        assert_eq!(links.steam_label, None);
        assert_eq!(links.steam_url.as_deref(), Some("https://store.example"));
        assert_eq!(links.site_label, None);
    }

    #[tokio::test]
    async fn test_write_trims_and_nulls_empty() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested"));

        store.write_client_id("  1234567890  ").await.unwrap();
        store
            .write_links(" Steam ", "https://steam.example", "   ", "https://site.example")
            .await
            .unwrap();

        let creds = store.read_credentials().await;
        assert_eq!(creds.client_id.as_deref(), Some("1234567890"));
        assert_eq!(creds.steam_label.as_deref(), Some("Steam"));
        assert_eq!(creds.site_label, None);
        assert_eq!(creds.missing_fields(), vec!["siteLabel"]);

        let raw = std::fs::read_to_string(store.links_config_path()).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert!(doc["siteLabel"].is_null());
    }

    #[tokio::test]
    async fn test_resolve_complete_credentials() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store.write_client_id("42").await.unwrap();
        store
            .write_links("Steam", "https://a.example", "Site", "https://b.example")
            .await
            .unwrap();

        let resolved = store.read_credentials().await.resolve().unwrap();
        assert_eq!(resolved.client_id, "42");
        assert_eq!(resolved.site_url, "https://b.example");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  x "), Some("x".to_string()));
        assert_eq!(normalize(" \t "), None);
        assert_eq!(normalize(""), None);
    }
}
