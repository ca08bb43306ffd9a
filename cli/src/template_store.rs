//! JSON-file template store.
//!
//! Each tenant's templates live in `<data_dir>/tenants/<tenant>/templates.json`. Every mutation
//! reads the document, applies the change, renumbers `order` to `0..n` and writes the file back
//! atomically. A store built without a data directory keeps everything in memory.

use std::collections::HashMap;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde::Deserialize;
use serde::Serialize;
use studio_protocol::MessageTemplate;
use studio_protocol::TemplateId;
use studio_protocol::TenantId;
use studio_protocol::ordering::renumber;
use studio_protocol::ordering::sort_by_order;
use studio_protocol::store::StoreError;
use studio_protocol::store::TemplateStore;
use studio_protocol::store::validate_template_fields;

use crate::atomic_write::write_atomic;

const TEMPLATES_FILE: &str = "templates.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct TemplateDocument {
    templates: Vec<MessageTemplate>,
}

pub struct JsonTemplateStore {
    data_dir: Option<PathBuf>,
    /// Serializes read-modify-write cycles; also the whole store when running in memory.
    memory: Mutex<HashMap<TenantId, Vec<MessageTemplate>>>,
}

impl JsonTemplateStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self::new_with_dir(Some(data_dir))
    }

    /// When `data_dir` is `None`, persistence is disabled and the store is purely in-memory.
    pub fn new_with_dir(data_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir,
            memory: Mutex::new(HashMap::new()),
        }
    }

    fn path_for(&self, tenant: &TenantId) -> Option<PathBuf> {
        self.data_dir
            .as_deref()
            .map(|dir| tenant_dir(dir, tenant).join(TEMPLATES_FILE))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TenantId, Vec<MessageTemplate>>> {
        self.memory
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn load(
        &self,
        memory: &HashMap<TenantId, Vec<MessageTemplate>>,
        tenant: &TenantId,
    ) -> Result<Vec<MessageTemplate>, StoreError> {
        let Some(path) = self.path_for(tenant) else {
            return Ok(memory.get(tenant).cloned().unwrap_or_default());
        };
        let mut templates = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str::<TemplateDocument>(&contents)
                    .map_err(|source| StoreError::Serialization {
                        path: path.clone(),
                        source,
                    })?
                    .templates
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        sort_by_order(&mut templates);
        renumber(&mut templates);
        Ok(templates)
    }

    fn save(
        &self,
        memory: &mut HashMap<TenantId, Vec<MessageTemplate>>,
        tenant: &TenantId,
        mut templates: Vec<MessageTemplate>,
    ) -> Result<(), StoreError> {
        renumber(&mut templates);
        let Some(path) = self.path_for(tenant) else {
            memory.insert(tenant.clone(), templates);
            return Ok(());
        };
        let document = TemplateDocument { templates };
        let json =
            serde_json::to_string_pretty(&document).map_err(|source| StoreError::Serialization {
                path: path.clone(),
                source,
            })?;
        write_atomic(&path, json.as_bytes()).map_err(|source| StoreError::Io { path, source })
    }
}

pub(crate) fn tenant_dir(data_dir: &Path, tenant: &TenantId) -> PathBuf {
    data_dir.join("tenants").join(tenant.as_str())
}

impl TemplateStore for JsonTemplateStore {
    fn list(&self, tenant: &TenantId) -> Result<Vec<MessageTemplate>, StoreError> {
        let memory = self.lock();
        self.load(&memory, tenant)
    }

    fn create(
        &self,
        tenant: &TenantId,
        title: &str,
        message: &str,
    ) -> Result<MessageTemplate, StoreError> {
        validate_template_fields(title, message)?;
        let mut memory = self.lock();
        let mut templates = self.load(&memory, tenant)?;
        let template = MessageTemplate {
            id: TemplateId::new(),
            title: title.trim().to_string(),
            message: message.to_string(),
            order: templates.len(),
        };
        templates.push(template.clone());
        self.save(&mut memory, tenant, templates)?;
        tracing::info!("created template {} for tenant {tenant}", template.id);
        Ok(template)
    }

    fn update(
        &self,
        tenant: &TenantId,
        id: &TemplateId,
        title: &str,
        message: &str,
    ) -> Result<MessageTemplate, StoreError> {
        validate_template_fields(title, message)?;
        let mut memory = self.lock();
        let mut templates = self.load(&memory, tenant)?;
        let Some(template) = templates.iter_mut().find(|template| template.id == *id) else {
            return Err(StoreError::NotFound(*id));
        };
        template.title = title.trim().to_string();
        template.message = message.to_string();
        let updated = template.clone();
        self.save(&mut memory, tenant, templates)?;
        tracing::info!("updated template {id} for tenant {tenant}");
        Ok(updated)
    }

    fn delete(&self, tenant: &TenantId, id: &TemplateId) -> Result<(), StoreError> {
        let mut memory = self.lock();
        let mut templates = self.load(&memory, tenant)?;
        let before = templates.len();
        templates.retain(|template| template.id != *id);
        if templates.len() == before {
            return Err(StoreError::NotFound(*id));
        }
        self.save(&mut memory, tenant, templates)?;
        tracing::info!("deleted template {id} for tenant {tenant}");
        Ok(())
    }

    fn reorder(&self, tenant: &TenantId, ordered_ids: &[TemplateId]) -> Result<(), StoreError> {
        let mut memory = self.lock();
        let templates = self.load(&memory, tenant)?;

        let requested: HashSet<&TemplateId> = ordered_ids.iter().collect();
        let stored: HashSet<&TemplateId> = templates.iter().map(|template| &template.id).collect();
        if requested.len() != ordered_ids.len() || requested != stored {
            return Err(StoreError::OrderMismatch);
        }

        let mut by_id: HashMap<TemplateId, MessageTemplate> = templates
            .into_iter()
            .map(|template| (template.id, template))
            .collect();
        let reordered = ordered_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        self.save(&mut memory, tenant, reordered)?;
        tracing::info!(
            "reordered {} templates for tenant {tenant}",
            ordered_ids.len()
        );
        Ok(())
    }
}
