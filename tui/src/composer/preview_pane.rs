use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;
use studio_protocol::preview::LinkResolver;
use studio_protocol::preview::PreviewSegment;
use studio_protocol::preview::resolve_preview;
use studio_protocol::variables::VariableBindings;

use super::surface::escape_for_display;
use crate::render::renderable::Renderable;

/// Style a resolved message: bound values green, unbound tokens yellow, links underlined.
pub fn preview_lines(segments: &[PreviewSegment]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    for segment in segments {
        let text = segment.display_text();
        for (idx, part) in text.split('\n').enumerate() {
            if idx > 0 {
                lines.push(Line::from(std::mem::take(&mut current)));
            }
            if part.is_empty() {
                continue;
            }
            let part = escape_for_display(part);
            current.push(match segment {
                PreviewSegment::Text(_) => Span::raw(part),
                PreviewSegment::Bound { .. } => part.green(),
                PreviewSegment::Unbound { .. } => part.yellow(),
                PreviewSegment::Link { .. } => part.cyan().underlined(),
            });
        }
    }
    lines.push(Line::from(current));
    lines
}

/// Read-only rendering of the composer's message resolved against the session bindings.
pub struct PreviewPane {
    lines: Vec<Line<'static>>,
}

impl PreviewPane {
    pub fn new(canonical: &str, bindings: &VariableBindings, links: &LinkResolver) -> Self {
        Self {
            lines: preview_lines(&resolve_preview(canonical, bindings, links)),
        }
    }
}

impl Renderable for PreviewPane {
    fn desired_height(&self, _width: u16) -> u16 {
        self.lines.len() as u16
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines.clone())
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
