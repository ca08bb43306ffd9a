mod message_composer;
mod preview_pane;
mod surface;

pub use message_composer::ComposerField;
pub use message_composer::ComposerInput;
pub use message_composer::ComposerSubmission;
pub use message_composer::MessageComposer;
pub use preview_pane::PreviewPane;
pub use preview_pane::preview_lines;
pub use surface::Chip;
pub use surface::ChipKind;
pub use surface::ChipRef;
pub use surface::Surface;
pub use surface::SurfaceNode;
pub use surface::render_surface;
pub(crate) use surface::escape_for_display;
