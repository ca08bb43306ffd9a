// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app_event;
mod app_event_sender;
pub mod composer;
mod notice;
mod render;
mod studio_tui;
pub mod template_list;
mod template_manager;
mod tui;

pub use studio_tui::StudioTui;
pub use template_manager::ManagerContext;
pub use template_manager::ManagerExit;
