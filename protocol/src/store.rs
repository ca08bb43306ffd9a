//! Collaborator contracts: template persistence, short links and message delivery.
//!
//! Implementations live outside this crate. The traits are synchronous; callers that must not
//! block (the terminal UI) run them on a blocking thread pool.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::template::MessageTemplate;
use crate::template::TemplateId;
use crate::template::TenantId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    #[error("template {0} not found")]
    NotFound(TemplateId),

    #[error("reorder ids do not match the stored templates")]
    OrderMismatch,

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reject templates with an empty title or message body.
pub fn validate_template_fields(title: &str, message: &str) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation { field: "title" });
    }
    if message.trim().is_empty() {
        return Err(StoreError::Validation { field: "message" });
    }
    Ok(())
}

/// Persistence of a tenant's message templates.
///
/// Implementations keep `order` contiguous: `create` appends, `delete` closes the gap and
/// `reorder` accepts only a permutation of the stored ids.
pub trait TemplateStore: Send + Sync {
    /// Templates sorted by `order`.
    fn list(&self, tenant: &TenantId) -> Result<Vec<MessageTemplate>, StoreError>;

    fn create(
        &self,
        tenant: &TenantId,
        title: &str,
        message: &str,
    ) -> Result<MessageTemplate, StoreError>;

    fn update(
        &self,
        tenant: &TenantId,
        id: &TemplateId,
        title: &str,
        message: &str,
    ) -> Result<MessageTemplate, StoreError>;

    fn delete(&self, tenant: &TenantId, id: &TemplateId) -> Result<(), StoreError>;

    fn reorder(&self, tenant: &TenantId, ordered_ids: &[TemplateId]) -> Result<(), StoreError>;
}

/// A stable short code issued for a portfolio slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub slug: String,
    pub code: String,
}

pub trait ShortLinkProvider: Send + Sync {
    fn get_or_create_short_link(
        &self,
        tenant: &TenantId,
        slug: &str,
    ) -> Result<ShortLink, StoreError>;
}

/// Fully resolved text ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub tenant: TenantId,
    pub template_id: Option<TemplateId>,
    /// Phone number of the recipient, when known.
    pub recipient: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// A link that opens the message in WhatsApp, when a recipient was given.
    pub deep_link: Option<String>,
}

pub trait MessageSink: Send + Sync {
    fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, StoreError>;
}
