//! The composer's editable surface: literal text, line breaks and atomic chips.
//!
//! The surface is always derived from the segment model ([`render_surface`]) and can be walked
//! back into a canonical string ([`Surface::extract_canonical`]). Text nodes hold the raw text;
//! escaping only happens when the surface is turned into terminal lines.

use std::collections::HashMap;

use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use studio_protocol::segment::Segment;
use studio_protocol::segment::Token;
use studio_protocol::variables::portfolio_label;
use studio_protocol::variables::variable_label;

const TAB_DISPLAY: &str = "    ";

/// Ordinal of a chip within the surface, counting from the start of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChipRef(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChipKind {
    Variable {
        key: String,
    },
    PortfolioLink {
        slug: String,
        /// Short-link code resolved for this slug, if any. Display only; never serialized.
        short_code: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub chip_ref: ChipRef,
    pub label: String,
    pub kind: ChipKind,
}

impl Chip {
    fn token(&self) -> Token {
        match &self.kind {
            ChipKind::Variable { key } => Token::Variable(key.clone()),
            ChipKind::PortfolioLink { slug, .. } => Token::PortfolioLink(slug.clone()),
        }
    }

    fn style(&self, selected: bool) -> Style {
        let bg = match self.kind {
            ChipKind::Variable { .. } => Color::Cyan,
            ChipKind::PortfolioLink { .. } => Color::Magenta,
        };
        let style = Style::default().fg(Color::Black).bg(bg);
        if selected {
            style
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            style
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceNode {
    Text(String),
    LineBreak,
    Chip(Chip),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surface {
    nodes: Vec<SurfaceNode>,
}

/// Build the surface for `segments`. `short_codes` maps portfolio slugs to resolved codes.
pub fn render_surface(segments: &[Segment], short_codes: &HashMap<String, String>) -> Surface {
    let mut nodes = Vec::new();
    let mut chip_idx = 0;
    for segment in segments {
        match segment {
            Segment::Text { value } => {
                for (line_idx, part) in value.split('\n').enumerate() {
                    if line_idx > 0 {
                        nodes.push(SurfaceNode::LineBreak);
                    }
                    if !part.is_empty() {
                        nodes.push(SurfaceNode::Text(part.to_string()));
                    }
                }
            }
            Segment::Variable { key } => {
                nodes.push(SurfaceNode::Chip(Chip {
                    chip_ref: ChipRef(chip_idx),
                    label: variable_label(key).to_string(),
                    kind: ChipKind::Variable { key: key.clone() },
                }));
                chip_idx += 1;
            }
            Segment::PortfolioLink { slug } => {
                nodes.push(SurfaceNode::Chip(Chip {
                    chip_ref: ChipRef(chip_idx),
                    label: portfolio_label(slug),
                    kind: ChipKind::PortfolioLink {
                        slug: slug.clone(),
                        short_code: short_codes.get(slug).cloned(),
                    },
                }));
                chip_idx += 1;
            }
        }
    }
    Surface { nodes }
}

impl Surface {
    pub fn nodes(&self) -> &[SurfaceNode] {
        &self.nodes
    }

    pub fn chips(&self) -> impl Iterator<Item = &Chip> {
        self.nodes.iter().filter_map(|node| match node {
            SurfaceNode::Chip(chip) => Some(chip),
            _ => None,
        })
    }

    pub fn chip_count(&self) -> usize {
        self.chips().count()
    }

    /// Walk the surface back into canonical form.
    ///
    /// Portfolio chips always serialize as `[[link_portafolio:<slug>]]`, even when a short code
    /// is attached, so stored messages stay portable between environments.
    pub fn extract_canonical(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                SurfaceNode::Text(text) => out.push_str(text),
                SurfaceNode::LineBreak => out.push('\n'),
                SurfaceNode::Chip(chip) => out.push_str(&chip.token().to_string()),
            }
        }
        out
    }

    /// Terminal lines for the surface; the chip matching `selected` is highlighted.
    pub fn to_lines(&self, selected: Option<ChipRef>) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let mut current: Vec<Span<'static>> = Vec::new();
        for node in &self.nodes {
            match node {
                SurfaceNode::Text(text) => current.push(Span::raw(escape_for_display(text))),
                SurfaceNode::LineBreak => lines.push(Line::from(std::mem::take(&mut current))),
                SurfaceNode::Chip(chip) => {
                    let is_selected = selected == Some(chip.chip_ref);
                    current.push(Span::styled(
                        format!(" {} ", chip.label),
                        chip.style(is_selected),
                    ));
                }
            }
        }
        lines.push(Line::from(current));
        lines
    }
}

/// Make raw text safe to paint: tabs become spaces, other control characters a replacement
/// glyph.
pub(crate) fn escape_for_display(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\t' => out.push_str(TAB_DISPLAY),
            c if c.is_control() => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use studio_protocol::segment::parse;
    use studio_protocol::segment::serialize;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn extract_canonical_matches_serialized_segments() {
        for input in [
            "",
            "Hola [[nombre_contacto]],\n\nte esperamos el [[fecha_evento]].",
            "[[link_portafolio:boda-ana]]\n",
            "\n\n",
            "tab\tseparado [[mal token]]",
        ] {
            let segments = parse(input);
            let surface = render_surface(&segments, &HashMap::new());
            assert_eq!(surface.extract_canonical(), serialize(&segments));
            assert_eq!(surface.extract_canonical(), input);
        }
    }

    #[test]
    fn chips_are_labelled_from_the_key_table() {
        let surface = render_surface(
            &parse("[[nombre_contacto]] [[codigo_cupon]] [[link_portafolio:boda-ana]]"),
            &HashMap::new(),
        );
        let labels: Vec<&str> = surface.chips().map(|chip| chip.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Nombre contacto", "codigo_cupon", "Portafolio: boda-ana"]
        );
        let refs: Vec<ChipRef> = surface.chips().map(|chip| chip.chip_ref).collect();
        assert_eq!(refs, vec![ChipRef(0), ChipRef(1), ChipRef(2)]);
    }

    #[test]
    fn short_code_is_attached_but_canonical_keeps_the_slug() {
        let short_codes = HashMap::from([("boda-ana".to_string(), "abc123".to_string())]);
        let surface = render_surface(&parse("Fotos: [[link_portafolio:boda-ana]]"), &short_codes);
        let chip = surface.chips().next().expect("portfolio chip");
        assert_eq!(
            chip.kind,
            ChipKind::PortfolioLink {
                slug: "boda-ana".to_string(),
                short_code: Some("abc123".to_string()),
            }
        );
        assert_eq!(
            surface.extract_canonical(),
            "Fotos: [[link_portafolio:boda-ana]]"
        );
    }

    #[test]
    fn lines_split_on_newlines_and_escape_controls() {
        let surface = render_surface(&parse("a\tb\u{7}\n[[fecha_evento]] fin\n"), &HashMap::new());
        let lines = surface.to_lines(None);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(
            texts,
            vec![
                "a    b\u{FFFD}".to_string(),
                " Fecha evento  fin".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn selected_chip_is_highlighted() {
        let surface = render_surface(&parse("[[nombre_contacto]][[fecha_evento]]"), &HashMap::new());
        let lines = surface.to_lines(Some(ChipRef(1)));
        let spans = &lines[0].spans;
        assert_eq!(spans[0].style.bg, Some(Color::Cyan));
        assert_eq!(spans[1].style.bg, Some(Color::Yellow));
    }
}
