use crate::template_manager::ManagerContext;
use crate::template_manager::ManagerExit;
use crate::template_manager::run_template_manager;
use crate::tui;
use crate::tui::Tui;

/// Terminal session for the studio screens.
///
/// Owns raw mode and the alternate screen for its whole lifetime and restores the terminal on
/// drop, including when the caller bails out early with an error.
pub struct StudioTui {
    tui: Tui,
}

impl StudioTui {
    /// Initialize the terminal (enter raw mode) and clear the screen.
    pub fn new() -> anyhow::Result<Self> {
        let mut terminal = tui::init()?;
        terminal.clear()?;
        Ok(Self {
            tui: Tui::new(terminal),
        })
    }

    /// Run the template manager until the user quits or asks to send a message.
    pub async fn manage_templates(&mut self, ctx: ManagerContext) -> anyhow::Result<ManagerExit> {
        run_template_manager(&mut self.tui, ctx).await
    }
}

impl Drop for StudioTui {
    fn drop(&mut self) {
        // Stop reading stdin before leaving raw mode so no keystrokes are swallowed.
        self.tui.pause_events();
        if let Err(err) = tui::restore() {
            tracing::warn!("failed to restore terminal: {err}");
        }
    }
}
