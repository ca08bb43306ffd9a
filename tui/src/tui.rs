//! Terminal lifecycle and the merged input/redraw event stream.

use std::io;
use std::io::Stdout;
use std::io::stdout;
use std::time::Duration;
use std::time::Instant;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Frame;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::StreamExt;

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Enter raw mode on the alternate screen with bracketed paste enabled.
pub fn init() -> io::Result<Terminal> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste)?;
    ratatui::Terminal::new(CrosstermBackend::new(stdout()))
}

/// Undo everything [`init`] did. Safe to call more than once.
pub fn restore() -> io::Result<()> {
    execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;
    disable_raw_mode()
}

#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    Draw,
}

/// Cheap handle that widgets use to ask for a redraw, now or after a delay.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    frame_schedule_tx: Option<UnboundedSender<Instant>>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        self.schedule_frame_in(Duration::ZERO);
    }

    pub fn schedule_frame_in(&self, delay: Duration) {
        if let Some(tx) = &self.frame_schedule_tx {
            let _ = tx.send(Instant::now() + delay);
        }
    }

    #[cfg(test)]
    pub fn test_dummy() -> Self {
        Self {
            frame_schedule_tx: None,
        }
    }
}

pub struct Tui {
    pub terminal: Terminal,
    frame_requester: FrameRequester,
    draw_rx: UnboundedReceiver<()>,
    events: Option<EventStream>,
}

impl Tui {
    pub fn new(terminal: Terminal) -> Self {
        let (frame_schedule_tx, frame_schedule_rx) = unbounded_channel();
        let (draw_tx, draw_rx) = unbounded_channel();
        tokio::spawn(run_frame_scheduler(frame_schedule_rx, draw_tx));
        Self {
            terminal,
            frame_requester: FrameRequester {
                frame_schedule_tx: Some(frame_schedule_tx),
            },
            draw_rx,
            events: Some(EventStream::new()),
        }
    }

    pub fn frame_requester(&self) -> FrameRequester {
        self.frame_requester.clone()
    }

    /// Drop the crossterm reader so it stops consuming stdin.
    pub fn pause_events(&mut self) {
        self.events = None;
    }

    /// Wait for the next key, paste or scheduled redraw. Returns `None` once input is closed.
    pub async fn next_event(&mut self) -> Option<TuiEvent> {
        let Self {
            events, draw_rx, ..
        } = self;
        loop {
            let input = async {
                match events.as_mut() {
                    Some(events) => events.next().await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                maybe_event = input => {
                    match maybe_event? {
                        Ok(Event::Key(key_event)) => return Some(TuiEvent::Key(key_event)),
                        Ok(Event::Paste(pasted)) => return Some(TuiEvent::Paste(pasted)),
                        Ok(Event::Resize(_, _)) => return Some(TuiEvent::Draw),
                        Ok(_) => continue,
                        Err(err) => {
                            tracing::warn!("failed to read terminal event: {err}");
                            return None;
                        }
                    }
                }
                maybe_draw = draw_rx.recv() => {
                    maybe_draw?;
                    return Some(TuiEvent::Draw);
                }
            }
        }
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }
}

/// Coalesce frame requests: many requests before the earliest deadline produce one redraw.
async fn run_frame_scheduler(
    mut requests: UnboundedReceiver<Instant>,
    draw_tx: UnboundedSender<()>,
) {
    let mut next_deadline: Option<Instant> = None;
    loop {
        let sleep_until = next_deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
        tokio::select! {
            request = requests.recv() => {
                let Some(at) = request else {
                    break;
                };
                next_deadline = Some(next_deadline.map_or(at, |current| current.min(at)));
            }
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(sleep_until)), if next_deadline.is_some() => {
                next_deadline = None;
                if draw_tx.send(()).is_err() {
                    break;
                }
            }
        }
    }
}
