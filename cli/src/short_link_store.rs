use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use rand::Rng as _;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use serde::Serialize;
use studio_protocol::TenantId;
use studio_protocol::segment::is_portfolio_slug;
use studio_protocol::store::ShortLink;
use studio_protocol::store::ShortLinkProvider;
use studio_protocol::store::StoreError;

use crate::atomic_write::write_atomic;
use crate::template_store::tenant_dir;

const SHORT_LINKS_FILE: &str = "short_links.json";
const CODE_LEN: usize = 6;

/// Slug to code, per tenant.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ShortLinkDocument {
    links: BTreeMap<String, String>,
}

/// Issues one stable short code per portfolio slug.
pub struct JsonShortLinkStore {
    data_dir: Option<PathBuf>,
    memory: Mutex<HashMap<TenantId, BTreeMap<String, String>>>,
}

impl JsonShortLinkStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self::new_with_dir(Some(data_dir))
    }

    pub fn new_with_dir(data_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir,
            memory: Mutex::new(HashMap::new()),
        }
    }

    fn path_for(&self, tenant: &TenantId) -> Option<PathBuf> {
        self.data_dir
            .as_deref()
            .map(|dir| tenant_dir(dir, tenant).join(SHORT_LINKS_FILE))
    }

    fn load(&self, tenant: &TenantId) -> Result<Option<BTreeMap<String, String>>, StoreError> {
        let Some(path) = self.path_for(tenant) else {
            return Ok(None);
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<ShortLinkDocument>(&contents)
                .map(|document| Some(document.links))
                .map_err(|source| StoreError::Serialization { path, source }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Some(BTreeMap::new())),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn persist(&self, tenant: &TenantId, links: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let Some(path) = self.path_for(tenant) else {
            return Ok(());
        };
        let document = ShortLinkDocument {
            links: links.clone(),
        };
        let json =
            serde_json::to_string_pretty(&document).map_err(|source| StoreError::Serialization {
                path: path.clone(),
                source,
            })?;
        write_atomic(&path, json.as_bytes()).map_err(|source| StoreError::Io { path, source })
    }
}

fn generate_code(taken: &BTreeMap<String, String>) -> String {
    let mut rng = rand::rng();
    loop {
        let code: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(CODE_LEN)
            .map(char::from)
            .collect();
        if !taken.values().any(|existing| *existing == code) {
            return code;
        }
    }
}

impl ShortLinkProvider for JsonShortLinkStore {
    fn get_or_create_short_link(
        &self,
        tenant: &TenantId,
        slug: &str,
    ) -> Result<ShortLink, StoreError> {
        if !is_portfolio_slug(slug) {
            return Err(StoreError::Validation { field: "slug" });
        }
        let mut memory = self
            .memory
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut links = match self.load(tenant)? {
            Some(links) => links,
            None => memory.get(tenant).cloned().unwrap_or_default(),
        };

        if let Some(code) = links.get(slug) {
            return Ok(ShortLink {
                slug: slug.to_string(),
                code: code.clone(),
            });
        }

        let code = generate_code(&links);
        links.insert(slug.to_string(), code.clone());
        self.persist(tenant, &links)?;
        memory.insert(tenant.clone(), links);
        tracing::info!("issued short link {code} for portfolio {slug} (tenant {tenant})");
        Ok(ShortLink {
            slug: slug.to_string(),
            code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tenant() -> TenantId {
        TenantId::new("estudio").expect("tenant")
    }

    #[test]
    fn codes_are_stable_per_slug() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonShortLinkStore::new(dir.path().to_path_buf());
        let first = store
            .get_or_create_short_link(&tenant(), "boda-ana")
            .expect("short link");
        assert_eq!(first.code.len(), 6);
        assert!(first.code.chars().all(|c| c.is_ascii_alphanumeric()));

        let again = JsonShortLinkStore::new(dir.path().to_path_buf())
            .get_or_create_short_link(&tenant(), "boda-ana")
            .expect("short link");
        assert_eq!(again, first);

        let other = store
            .get_or_create_short_link(&tenant(), "quince-sofi")
            .expect("short link");
        assert_ne!(other.code, first.code);
    }

    #[test]
    fn in_memory_store_remembers_codes() {
        let store = JsonShortLinkStore::new_with_dir(None);
        let first = store
            .get_or_create_short_link(&tenant(), "boda-ana")
            .expect("short link");
        let second = store
            .get_or_create_short_link(&tenant(), "boda-ana")
            .expect("short link");
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_invalid_slugs() {
        let store = JsonShortLinkStore::new_with_dir(None);
        assert!(matches!(
            store.get_or_create_short_link(&tenant(), "con espacio"),
            Err(StoreError::Validation { field: "slug" })
        ));
    }
}
