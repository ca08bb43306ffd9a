//! Delivery log for resolved messages.
//!
//! Sending is a hand-off: the resolved text is appended to `sent.jsonl` and, when a phone number
//! is known, a WhatsApp deep link is returned for the user to open.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;

use chrono::SecondsFormat;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use studio_protocol::TemplateId;
use studio_protocol::TenantId;
use studio_protocol::store::MessageSink;
use studio_protocol::store::OutgoingMessage;
use studio_protocol::store::SendReceipt;
use studio_protocol::store::StoreError;
use url::Url;

use crate::template_store::tenant_dir;

const SENT_LOG_FILE: &str = "sent.jsonl";
const WHATSAPP_BASE_URL: &str = "https://wa.me/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SentRecord {
    sent_at: String,
    tenant: TenantId,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<TemplateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient: Option<String>,
    text: String,
}

pub struct SendLog {
    data_dir: PathBuf,
}

impl SendLog {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn path_for(&self, tenant: &TenantId) -> PathBuf {
        tenant_dir(&self.data_dir, tenant).join(SENT_LOG_FILE)
    }
}

/// Build `https://wa.me/<digits>?text=<encoded>`. Returns `None` when `phone` has no digits.
pub fn whatsapp_deep_link(phone: &str, text: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let mut url = Url::parse(WHATSAPP_BASE_URL).ok()?.join(&digits).ok()?;
    url.query_pairs_mut().append_pair("text", text);
    Some(url.into())
}

impl MessageSink for SendLog {
    fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, StoreError> {
        let deep_link = match message.recipient.as_deref() {
            Some(phone) => Some(
                whatsapp_deep_link(phone, &message.text)
                    .ok_or(StoreError::Validation { field: "phone" })?,
            ),
            None => None,
        };

        let path = self.path_for(&message.tenant);
        let record = SentRecord {
            sent_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            tenant: message.tenant.clone(),
            template_id: message.template_id,
            recipient: message.recipient.clone(),
            text: message.text.clone(),
        };
        let line = serde_json::to_string(&record).map_err(|source| StoreError::Serialization {
            path: path.clone(),
            source,
        })?;

        let append = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{line}")?;
            file.flush()
        };
        append().map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            "logged message for tenant {} to {}",
            message.tenant,
            path.display()
        );
        Ok(SendReceipt { deep_link })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message(recipient: Option<&str>) -> OutgoingMessage {
        OutgoingMessage {
            tenant: TenantId::new("estudio").expect("tenant"),
            template_id: None,
            recipient: recipient.map(str::to_string),
            text: "Hola Ana, mira https://estudio.example/s/abc123".to_string(),
        }
    }

    #[test]
    fn deep_link_keeps_digits_and_encodes_text() {
        let link = whatsapp_deep_link("+54 9 11 5555-0000", "Hola Ana & co\nchau")
            .expect("deep link");
        insta::assert_snapshot!(link, @"https://wa.me/5491155550000?text=Hola+Ana+%26+co%0Achau");
        assert_eq!(whatsapp_deep_link("sin numero", "hola"), None);
    }

    #[test]
    fn send_appends_json_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = SendLog::new(dir.path().to_path_buf());

        let receipt = log.send(&message(Some("5491155550000"))).expect("send");
        assert!(
            receipt
                .deep_link
                .as_deref()
                .is_some_and(|link| link.starts_with("https://wa.me/5491155550000?text=Hola"))
        );
        let receipt = log.send(&message(None)).expect("send");
        assert_eq!(receipt, SendReceipt { deep_link: None });

        let contents = std::fs::read_to_string(
            dir.path()
                .join("tenants")
                .join("estudio")
                .join("sent.jsonl"),
        )
        .expect("read log");
        let records: Vec<SentRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("decode record"))
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].recipient.as_deref(), Some("5491155550000"));
        assert_eq!(records[1].recipient, None);
        assert_eq!(records[1].text, message(None).text);
    }

    #[test]
    fn phone_without_digits_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = SendLog::new(dir.path().to_path_buf());
        assert!(matches!(
            log.send(&message(Some("n/a"))),
            Err(StoreError::Validation { field: "phone" })
        ));
    }
}
