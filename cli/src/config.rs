use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;
use toml_edit::Table as TomlTable;
use toml_edit::value;

use crate::atomic_write::write_atomic_text;

pub const DEFAULT_TENANT: &str = "default";
pub const DEFAULT_PORTFOLIO_BASE_URL: &str = "https://studio.example/portafolio";

/// Settings read from `config.toml`, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    pub tenant: String,
    pub data_dir: PathBuf,
    pub portfolio_base_url: String,
    pub short_link_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config. A missing file or missing keys fall back to defaults; `data_dir`
    /// defaults to the directory holding the config file.
    pub fn load(&self) -> anyhow::Result<StudioConfig> {
        let default_data_dir = self
            .path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(StudioConfig {
                tenant: DEFAULT_TENANT.to_string(),
                data_dir: default_data_dir,
                portfolio_base_url: DEFAULT_PORTFOLIO_BASE_URL.to_string(),
                short_link_base_url: None,
            });
        };

        let doc = content
            .parse::<DocumentMut>()
            .with_context(|| format!("parse {}", self.path.display()))?;

        let links = doc.get("links").and_then(TomlItem::as_table);
        let link_str = |key: &str| {
            links
                .and_then(|links| links.get(key))
                .and_then(TomlItem::as_str)
                .map(str::to_string)
        };

        Ok(StudioConfig {
            tenant: read_str(&doc, "tenant").unwrap_or_else(|| DEFAULT_TENANT.to_string()),
            data_dir: read_str(&doc, "data_dir").map_or(default_data_dir, PathBuf::from),
            portfolio_base_url: link_str("portfolio_base_url")
                .unwrap_or_else(|| DEFAULT_PORTFOLIO_BASE_URL.to_string()),
            short_link_base_url: link_str("short_link_base_url"),
        })
    }

    /// Set the default tenant, keeping comments and unrelated keys intact.
    pub fn set_tenant(&self, tenant: &str) -> anyhow::Result<()> {
        let content = read_document_string(&self.path)?.unwrap_or_default();
        let mut doc = content
            .parse::<DocumentMut>()
            .with_context(|| format!("parse {}", self.path.display()))?;
        doc["tenant"] = value(tenant);
        write_atomic_text(&self.path, &doc.to_string())
    }

    /// Set a key under `[links]`.
    pub fn set_link(&self, key: &str, url: &str) -> anyhow::Result<()> {
        let content = read_document_string(&self.path)?.unwrap_or_default();
        let mut doc = content
            .parse::<DocumentMut>()
            .with_context(|| format!("parse {}", self.path.display()))?;
        let links = ensure_table_for_write(&mut doc, "links");
        links[key] = value(url);
        write_atomic_text(&self.path, &doc.to_string())
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".studio").join("config.toml")
}

fn read_str(doc: &DocumentMut, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(TomlItem::as_str)
        .map(str::to_string)
}

fn ensure_table_for_write<'a>(doc: &'a mut DocumentMut, key: &str) -> &'a mut TomlTable {
    if doc.get(key).and_then(TomlItem::as_table).is_none() {
        let mut table = TomlTable::new();
        table.set_implicit(false);
        doc[key] = TomlItem::Table(table);
    }
    match doc.get_mut(key).and_then(TomlItem::as_table_mut) {
        Some(table) => table,
        None => unreachable!("`{key}` was just inserted as a table"),
    }
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}
