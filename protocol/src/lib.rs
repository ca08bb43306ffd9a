pub mod ordering;
pub mod preview;
pub mod segment;
pub mod store;
pub mod template;
pub mod variables;

pub use template::InvalidTenant;
pub use template::MessageTemplate;
pub use template::TemplateId;
pub use template::TenantId;
