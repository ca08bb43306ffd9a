use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use studio_protocol::MessageTemplate;
use studio_protocol::TemplateId;

use super::reorder::DragPhase;
use super::reorder::ReorderOutcome;
use super::reorder::ReorderRequest;
use super::reorder::ReorderableList;
use crate::composer::escape_for_display;
use crate::render::renderable::Renderable;

/// What the manager screen should do after a list key.
#[derive(Debug, PartialEq, Eq)]
pub enum ListAction {
    None,
    Redraw,
    Load(TemplateId),
    NewTemplate,
    Delete(TemplateId),
    /// A drop was applied locally and must now be written to the store.
    Persist(ReorderRequest<TemplateId>),
}

pub struct TemplateListView {
    list: ReorderableList<MessageTemplate>,
    selected_idx: usize,
}

impl Default for TemplateListView {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TemplateListView {
    pub fn new(templates: Vec<MessageTemplate>) -> Self {
        Self {
            list: ReorderableList::new(templates),
            selected_idx: 0,
        }
    }

    pub fn templates(&self) -> &[MessageTemplate] {
        self.list.items()
    }

    pub fn is_busy(&self) -> bool {
        self.list.is_busy()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.list.phase(), DragPhase::Dragging { .. })
    }

    pub fn selected_template(&self) -> Option<&MessageTemplate> {
        self.list.items().get(self.selected_idx)
    }

    /// Replace the rows with the store's list, keeping the selection on the same template.
    pub fn set_templates(&mut self, templates: Vec<MessageTemplate>) -> bool {
        let selected = self.selected_template().map(|template| template.id);
        if !self.list.replace_items(templates) {
            return false;
        }
        self.selected_idx = selected
            .and_then(|id| self.list.index_of(&id))
            .unwrap_or(self.selected_idx)
            .min(self.list.len().saturating_sub(1));
        true
    }

    pub fn select(&mut self, id: TemplateId) {
        if let Some(idx) = self.list.index_of(&id) {
            self.selected_idx = idx;
        }
    }

    pub fn commit_reorder(&mut self) -> Option<ReorderOutcome> {
        self.list.commit()
    }

    /// Restore the pre-drag order and keep the moved template selected.
    pub fn rollback_reorder(&mut self) -> Option<ReorderOutcome> {
        let selected = self.selected_template().map(|template| template.id);
        let outcome = self.list.rollback();
        if let Some(id) = selected {
            self.select(id);
        }
        outcome
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> ListAction {
        if key_event.kind == KeyEventKind::Release {
            return ListAction::None;
        }
        match self.list.phase() {
            DragPhase::Dragging { over, .. } => self.handle_dragging_key(key_event, over),
            DragPhase::Idle | DragPhase::Persisting => self.handle_idle_key(key_event),
        }
    }

    fn handle_dragging_key(&mut self, key_event: KeyEvent, over: usize) -> ListAction {
        match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.list.drag_over(over.saturating_sub(1));
                ListAction::Redraw
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.list.drag_over(over + 1);
                ListAction::Redraw
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let target = over;
                match self.list.drop_dragged() {
                    Some(request) => {
                        self.selected_idx = target;
                        ListAction::Persist(request)
                    }
                    None => ListAction::Redraw,
                }
            }
            KeyCode::Esc => {
                self.list.cancel_drag();
                ListAction::Redraw
            }
            _ => ListAction::None,
        }
    }

    fn handle_idle_key(&mut self, key_event: KeyEvent) -> ListAction {
        if key_event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return ListAction::None;
        }
        let len = self.list.len();
        match key_event.code {
            KeyCode::Up | KeyCode::Char('k') if len > 0 => {
                self.selected_idx = self.selected_idx.checked_sub(1).unwrap_or(len - 1);
                ListAction::Redraw
            }
            KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                self.selected_idx = (self.selected_idx + 1) % len;
                ListAction::Redraw
            }
            KeyCode::Char(' ') => {
                if self.list.begin_drag(self.selected_idx) {
                    ListAction::Redraw
                } else {
                    ListAction::None
                }
            }
            KeyCode::Enter => self
                .selected_template()
                .map_or(ListAction::None, |template| ListAction::Load(template.id)),
            KeyCode::Char('n') => ListAction::NewTemplate,
            KeyCode::Char('d') if !self.is_busy() => self
                .selected_template()
                .map_or(ListAction::None, |template| ListAction::Delete(template.id)),
            _ => ListAction::None,
        }
    }

    fn header(&self) -> Line<'static> {
        let count = match self.list.len() {
            1 => "1 template".to_string(),
            n => format!("{n} templates"),
        };
        let mut spans: Vec<Span<'static>> = vec![count.dim()];
        match self.list.phase() {
            DragPhase::Dragging { .. } => spans.push("  moving, space to drop".cyan()),
            DragPhase::Persisting => spans.push("  saving order…".dim()),
            DragPhase::Idle => {}
        }
        Line::from(spans)
    }

    fn rows(&self) -> Vec<Line<'static>> {
        let dragging = match self.list.phase() {
            DragPhase::Dragging { over, .. } => Some(over),
            _ => None,
        };
        self.list
            .preview()
            .into_iter()
            .enumerate()
            .map(|(idx, template)| {
                let is_selected = dragging.unwrap_or(self.selected_idx) == idx;
                let prefix = if is_selected { '›' } else { ' ' };
                let title = escape_for_display(&template.title);
                let row = format!("{prefix} {}. {title}", idx + 1);
                if dragging == Some(idx) {
                    Line::from(row.cyan().bold())
                } else if is_selected {
                    Line::from(row.bold())
                } else {
                    Line::from(row)
                }
            })
            .collect()
    }
}

impl Renderable for TemplateListView {
    fn desired_height(&self, _width: u16) -> u16 {
        1 + self.list.len().max(1) as u16
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let mut lines = vec![self.header()];
        if self.list.is_empty() {
            lines.push(Line::from("  no templates yet, press n to create one".dim()));
        } else {
            let rows = self.rows();
            let visible = usize::from(area.height.saturating_sub(1)).max(1);
            let focus = match self.list.phase() {
                DragPhase::Dragging { over, .. } => over,
                _ => self.selected_idx,
            };
            let start = (focus + 1).saturating_sub(visible);
            lines.extend(rows.into_iter().skip(start).take(visible));
        }
        Paragraph::new(lines).render(area, buf);
    }
}
