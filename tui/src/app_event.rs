//! Application-level events used to coordinate UI actions.
//!
//! Store and short-link calls run on the blocking pool; their results come back to the UI loop
//! through these events. Errors are carried as display strings because they only ever end up
//! in a notice.

use studio_protocol::MessageTemplate;
use studio_protocol::TemplateId;
use studio_protocol::store::ShortLink;

#[derive(Debug)]
pub enum AppEvent {
    TemplatesLoaded(Result<Vec<MessageTemplate>, String>),

    /// A create or update finished. `created` distinguishes the two for the notice text.
    TemplateSaved {
        result: Result<MessageTemplate, String>,
        created: bool,
    },

    TemplateDeleted(Result<TemplateId, String>),

    /// Result of persisting the order produced by the last drag.
    ReorderPersisted(Result<(), String>),

    ShortLinkResolved {
        slug: String,
        result: Result<ShortLink, String>,
    },
}
