//! The message composer is the template editor's text input state machine.
//!
//! It owns a segment model (literal text plus variable/portfolio chips) and a single-line title.
//! Every edit mutates the model and the visible surface is re-derived from it, so the canonical
//! string is always reconstructable.
//!
//! # Editing model
//!
//! Input is append-only: typed characters, pastes and tokens land at the end of the message.
//! Mid-text insertion is deliberately unsupported so a chip boundary can never be split.
//! Backspace removes the last character, or the whole chip when the message ends in one.
//!
//! # Chips
//!
//! - <kbd>Alt</kbd>+<kbd>1</kbd>..<kbd>4</kbd> insert the known variables.
//! - <kbd>Ctrl</kbd>+<kbd>L</kbd> inserts the session's portfolio link.
//! - <kbd>Ctrl</kbd>+<kbd>←</kbd>/<kbd>→</kbd> select a chip and <kbd>Delete</kbd> removes it.
//!
//! Token insertion keeps exactly one space before the chip (none when the message is empty or
//! already ends in whitespace) and one space after it.
//!
//! # Unmounted composer
//!
//! A composer that is not attached to a screen has no surface to edit. Token insertion then
//! falls back to plain string concatenation on the canonical message with the same spacing
//! rule, which keeps the result parseable.

use std::collections::HashMap;

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
use studio_protocol::segment::Segment;
use studio_protocol::segment::Token;
use studio_protocol::segment::append_token_to_canonical;
use studio_protocol::segment::needs_leading_separator;
use studio_protocol::segment::normalize;
use studio_protocol::segment::parse;
use studio_protocol::store::validate_template_fields;
use studio_protocol::variables::KnownVariable;
use unicode_width::UnicodeWidthStr;

use super::surface::ChipRef;
use super::surface::Surface;
use super::surface::escape_for_display;
use super::surface::render_surface;
use crate::render::renderable::Renderable;

const TITLE_PREFIX: &str = "Title: ";
const BODY_PLACEHOLDER: &str = "Type a message… alt+1..4 variables, ctrl+l portfolio link";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerField {
    Title,
    Body,
}

/// Side effects the owning screen must act on after a key.
#[derive(Debug, PartialEq, Eq)]
pub enum ComposerInput {
    None,
    /// A portfolio chip was inserted; the screen may resolve a short link for it.
    PortfolioLinkInserted { slug: String },
}

/// A validated title and canonical body ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerSubmission {
    pub id: Option<TemplateId>,
    pub title: String,
    pub message: String,
}

pub struct MessageComposer {
    title: String,
    segments: Vec<Segment>,
    short_codes: HashMap<String, String>,
    selected_chip: Option<ChipRef>,
    field: ComposerField,
    has_focus: bool,
    /// False until a screen attaches the composer; see the module docs.
    mounted: bool,
    editing: Option<TemplateId>,
    portfolio_slug: Option<String>,
    validation_error: Option<String>,
}

impl Default for MessageComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageComposer {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            segments: vec![Segment::text("")],
            short_codes: HashMap::new(),
            selected_chip: None,
            field: ComposerField::Body,
            has_focus: false,
            mounted: false,
            editing: None,
            portfolio_slug: None,
            validation_error: None,
        }
    }

    pub fn set_mounted(&mut self, mounted: bool) {
        self.mounted = mounted;
    }

    pub fn set_focus(&mut self, field: Option<ComposerField>) {
        self.has_focus = field.is_some();
        if let Some(field) = field {
            self.field = field;
        }
    }

    pub fn field(&self) -> ComposerField {
        self.field
    }

    pub fn set_portfolio_slug(&mut self, slug: Option<String>) {
        self.portfolio_slug = slug;
    }

    /// Hydrate the composer from a saved template.
    pub fn load_template(&mut self, template: &MessageTemplate) {
        self.title = template.title.clone();
        self.segments = template.segments();
        self.editing = Some(template.id);
        self.selected_chip = None;
        self.validation_error = None;
    }

    /// Clear everything and start a new, unsaved template.
    pub fn start_new(&mut self) {
        self.title.clear();
        self.segments = vec![Segment::text("")];
        self.editing = None;
        self.selected_chip = None;
        self.validation_error = None;
    }

    /// Replace the body with a canonical string.
    pub fn set_canonical(&mut self, canonical: &str) {
        self.segments = parse(canonical);
        self.selected_chip = None;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn editing(&self) -> Option<TemplateId> {
        self.editing
    }

    /// Called after a template save so later saves update it instead of creating a copy.
    pub fn mark_saved(&mut self, template: &MessageTemplate) {
        if self.editing.is_none() || self.editing == Some(template.id) {
            self.editing = Some(template.id);
        }
    }

    /// Forget the template being edited if it was deleted.
    pub fn forget_template(&mut self, id: TemplateId) {
        if self.editing == Some(id) {
            self.editing = None;
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn surface(&self) -> Surface {
        render_surface(&self.segments, &self.short_codes)
    }

    pub fn canonical(&self) -> String {
        self.surface().extract_canonical()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.segments.iter().all(segment_is_empty)
    }

    pub fn selected_chip(&self) -> Option<ChipRef> {
        self.selected_chip
    }

    pub fn clear_chip_selection(&mut self) -> bool {
        self.selected_chip.take().is_some()
    }

    /// Attach a resolved short-link code to every chip for `slug`.
    pub fn record_short_link(&mut self, slug: impl Into<String>, code: impl Into<String>) {
        self.short_codes.insert(slug.into(), code.into());
    }

    pub fn short_codes(&self) -> &HashMap<String, String> {
        &self.short_codes
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    /// Append a chip at the end of the message. A token that would not parse back as a chip is
    /// rejected with an inline error and the message is left unchanged.
    pub fn insert_token(&mut self, token: Token) -> bool {
        if !token.is_well_formed() {
            tracing::warn!("refusing to insert malformed token {token}");
            self.validation_error = Some(match &token {
                Token::Variable(key) => format!("Invalid variable key `{key}`"),
                Token::PortfolioLink(slug) => format!("Invalid portfolio slug `{slug}`"),
            });
            return false;
        }
        if self.mounted {
            let needs_separator = match self.segments.last() {
                Some(Segment::Text { value }) => needs_leading_separator(value),
                Some(_) => true,
                None => false,
            };
            if needs_separator {
                self.push_body_text(" ");
            }
            self.segments.push(token.into_segment());
            self.segments.push(Segment::text(" "));
            self.segments = normalize(std::mem::take(&mut self.segments));
        } else {
            tracing::debug!("composer has no active surface; appending {token} as text");
            let canonical = append_token_to_canonical(&self.canonical(), &token);
            self.segments = parse(&canonical);
        }
        self.selected_chip = None;
        self.validation_error = None;
        true
    }

    /// Remove a single chip. Returns false when `chip` does not exist.
    pub fn remove_token(&mut self, chip: ChipRef) -> bool {
        let Some(idx) = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.is_chip())
            .nth(chip.0)
            .map(|(idx, _)| idx)
        else {
            return false;
        };
        self.segments.remove(idx);
        self.segments = normalize(std::mem::take(&mut self.segments));
        self.selected_chip = None;
        true
    }

    /// Validate and return the current content for saving. On failure the error is shown inline
    /// and nothing is returned.
    pub fn submission(&mut self) -> Option<ComposerSubmission> {
        let message = self.canonical();
        if let Err(err) = validate_template_fields(&self.title, &message) {
            self.validation_error = Some(capitalize_first(&err.to_string()));
            return None;
        }
        self.validation_error = None;
        Some(ComposerSubmission {
            id: self.editing,
            title: self.title.trim().to_string(),
            message,
        })
    }

    pub fn handle_paste(&mut self, pasted: String) -> bool {
        let pasted = pasted.replace("\r\n", "\n").replace('\r', "\n");
        if pasted.is_empty() {
            return false;
        }
        match self.field {
            ComposerField::Title => self.title.push_str(&pasted.replace('\n', " ")),
            ComposerField::Body => self.push_body_text(&pasted),
        }
        self.selected_chip = None;
        true
    }

    /// Handle a key event. Returns the side effect for the screen and whether a redraw is needed.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> (ComposerInput, bool) {
        if key_event.kind == KeyEventKind::Release {
            return (ComposerInput::None, false);
        }

        match key_event {
            KeyEvent {
                code: KeyCode::Char(c),
                modifiers: KeyModifiers::ALT,
                ..
            } if self.field == ComposerField::Body => {
                let Some(variable) = c
                    .to_digit(10)
                    .and_then(|d| (d as usize).checked_sub(1))
                    .and_then(|idx| KnownVariable::ALL.get(idx))
                else {
                    return (ComposerInput::None, false);
                };
                self.insert_token(Token::Variable(variable.key().to_string()));
                (ComposerInput::None, true)
            }
            KeyEvent {
                code: KeyCode::Char('l'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } if self.field == ComposerField::Body => self.insert_portfolio_link(),
            KeyEvent {
                code: KeyCode::Left,
                modifiers: KeyModifiers::CONTROL,
                ..
            } if self.field == ComposerField::Body => (ComposerInput::None, self.select_chip(-1)),
            KeyEvent {
                code: KeyCode::Right,
                modifiers: KeyModifiers::CONTROL,
                ..
            } if self.field == ComposerField::Body => (ComposerInput::None, self.select_chip(1)),
            KeyEvent {
                code: KeyCode::Delete,
                ..
            } => {
                let removed = match self.selected_chip {
                    Some(chip) => self.remove_token(chip),
                    None => false,
                };
                (ComposerInput::None, removed)
            }
            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => {
                let changed = match self.field {
                    ComposerField::Title => self.title.pop().is_some(),
                    ComposerField::Body => self.backspace_body(),
                };
                self.selected_chip = None;
                (ComposerInput::None, changed)
            }
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => {
                match self.field {
                    ComposerField::Title => self.field = ComposerField::Body,
                    ComposerField::Body => self.push_body_text("\n"),
                }
                self.selected_chip = None;
                (ComposerInput::None, true)
            }
            KeyEvent {
                code: KeyCode::Char(c),
                modifiers,
                ..
            } if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                match self.field {
                    ComposerField::Title => self.title.push(c),
                    ComposerField::Body => {
                        let mut buf = [0u8; 4];
                        self.push_body_text(c.encode_utf8(&mut buf));
                    }
                }
                self.selected_chip = None;
                self.validation_error = None;
                (ComposerInput::None, true)
            }
            _ => (ComposerInput::None, false),
        }
    }

    fn insert_portfolio_link(&mut self) -> (ComposerInput, bool) {
        let Some(slug) = self.portfolio_slug.clone() else {
            self.validation_error =
                Some("No portfolio selected for this session (use --portfolio)".to_string());
            return (ComposerInput::None, true);
        };
        if !self.insert_token(Token::PortfolioLink(slug.clone())) {
            return (ComposerInput::None, true);
        }
        (ComposerInput::PortfolioLinkInserted { slug }, true)
    }

    fn select_chip(&mut self, step: isize) -> bool {
        let count = self.segments.iter().filter(|s| s.is_chip()).count();
        if count == 0 {
            return false;
        }
        let next = match (self.selected_chip, step < 0) {
            (None, true) => count - 1,
            (None, false) => 0,
            (Some(ChipRef(idx)), true) => idx.saturating_sub(1),
            (Some(ChipRef(idx)), false) => (idx + 1).min(count - 1),
        };
        let changed = self.selected_chip != Some(ChipRef(next));
        self.selected_chip = Some(ChipRef(next));
        changed
    }

    fn push_body_text(&mut self, text: &str) {
        match self.segments.last_mut() {
            Some(Segment::Text { value }) => value.push_str(text),
            _ => self.segments.push(Segment::text(text)),
        }
        self.validation_error = None;
    }

    fn backspace_body(&mut self) -> bool {
        match self.segments.last_mut() {
            Some(Segment::Text { value }) => {
                if value.pop().is_none() {
                    return false;
                }
            }
            Some(_) => {
                self.segments.pop();
            }
            None => return false,
        }
        self.segments = normalize(std::mem::take(&mut self.segments));
        true
    }

    fn body_lines(&self) -> Vec<Line<'static>> {
        if self.segments.iter().all(segment_is_empty) {
            return vec![Line::from(BODY_PLACEHOLDER.dim())];
        }
        self.surface().to_lines(self.selected_chip)
    }

    fn title_line(&self) -> Line<'static> {
        let title = if self.title.is_empty() && self.field != ComposerField::Title {
            "untitled".dim().italic()
        } else {
            Span::from(escape_for_display(&self.title)).bold()
        };
        Line::from(vec![TITLE_PREFIX.dim(), title])
    }
}

fn segment_is_empty(segment: &Segment) -> bool {
    matches!(segment, Segment::Text { value } if value.is_empty())
}

fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => {
            let mut capitalized = first.to_uppercase().collect::<String>();
            capitalized.push_str(chars.as_str());
            capitalized
        }
        None => String::new(),
    }
}

impl Renderable for MessageComposer {
    fn desired_height(&self, _width: u16) -> u16 {
        let body = self.body_lines().len() as u16;
        let error = u16::from(self.validation_error.is_some());
        2 + body + error
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let mut lines = vec![self.title_line(), Line::default()];
        lines.extend(self.body_lines());
        if let Some(err) = &self.validation_error {
            lines.push(Line::from(err.clone().red()));
        }
        Paragraph::new(lines).render(area, buf);
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if !self.has_focus || area.is_empty() {
            return None;
        }
        let (col, row) = match self.field {
            ComposerField::Title => {
                let width = TITLE_PREFIX.width() + escape_for_display(&self.title).width();
                (width, 0)
            }
            ComposerField::Body => {
                if self.segments.iter().all(segment_is_empty) {
                    (0, 2)
                } else {
                    let lines = self.surface().to_lines(None);
                    let last = lines.last().map_or(0, Line::width);
                    (last, 1 + lines.len())
                }
            }
        };
        let x = area.x + (col as u16).min(area.width.saturating_sub(1));
        let y = area.y + (row as u16).min(area.height.saturating_sub(1));
        Some((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;
    use crossterm::event::KeyEvent;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    fn mounted() -> MessageComposer {
        let mut composer = MessageComposer::new();
        composer.set_mounted(true);
        composer.set_focus(Some(ComposerField::Body));
        composer
    }

    fn type_str(composer: &mut MessageComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key_event(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn has_double_whitespace(text: &str) -> bool {
        text.chars()
            .zip(text.chars().skip(1))
            .any(|(a, b)| a.is_whitespace() && b.is_whitespace())
    }

    #[test]
    fn typing_then_inserting_adds_single_separators() {
        let mut composer = mounted();
        type_str(&mut composer, "Hola");
        composer.insert_token(Token::Variable("nombre_contacto".to_string()));
        assert_eq!(composer.canonical(), "Hola [[nombre_contacto]] ");

        type_str(&mut composer, ", gracias");
        assert_eq!(composer.canonical(), "Hola [[nombre_contacto]] , gracias");
    }

    #[test]
    fn inserting_after_whitespace_never_doubles_it() {
        for prefix in ["Hola ", "Hola\n", "Hola\t", ""] {
            let mut composer = mounted();
            composer.set_canonical(prefix);
            composer.insert_token(Token::Variable("fecha_evento".to_string()));
            let canonical = composer.canonical();
            assert_eq!(canonical, format!("{prefix}[[fecha_evento]] "));
            assert!(
                !has_double_whitespace(canonical.trim_end()),
                "prefix {prefix:?}"
            );
        }
    }

    #[test]
    fn consecutive_tokens_share_one_space() {
        let mut composer = mounted();
        composer.insert_token(Token::Variable("nombre_contacto".to_string()));
        composer.insert_token(Token::Variable("nombre_evento".to_string()));
        assert_eq!(
            composer.canonical(),
            "[[nombre_contacto]] [[nombre_evento]] "
        );
    }

    #[test]
    fn unmounted_insertion_matches_mounted_result() {
        for prefix in ["", "Hola", "Hola ", "[[nombre_contacto]]"] {
            let mut on_surface = mounted();
            on_surface.set_canonical(prefix);
            on_surface.insert_token(Token::PortfolioLink("boda-ana".to_string()));

            let mut detached = MessageComposer::new();
            detached.set_canonical(prefix);
            detached.insert_token(Token::PortfolioLink("boda-ana".to_string()));

            assert_eq!(detached.canonical(), on_surface.canonical());
            assert_eq!(detached.segments(), on_surface.segments());
        }
    }

    #[test]
    fn malformed_tokens_are_rejected_on_both_paths() {
        for mut composer in [mounted(), MessageComposer::new()] {
            composer.set_portfolio_slug(Some("boda ana".to_string()));
            composer.set_focus(Some(ComposerField::Body));
            type_str(&mut composer, "Fotos:");
            let (input, redraw) =
                composer.handle_key_event(key(KeyCode::Char('l'), KeyModifiers::CONTROL));
            assert_eq!(input, ComposerInput::None);
            assert!(redraw);
            assert!(!composer.insert_token(Token::Variable("mal key".to_string())));

            assert_eq!(composer.canonical(), "Fotos:");
            assert_eq!(parse(&composer.canonical()), composer.segments());
            assert_eq!(
                composer.validation_error(),
                Some("Invalid variable key `mal key`")
            );
        }
    }

    #[test]
    fn portfolio_chip_serializes_with_slug_even_with_short_code() {
        let mut composer = mounted();
        composer.set_portfolio_slug(Some("boda-ana".to_string()));
        type_str(&mut composer, "Fotos:");
        let (input, redraw) =
            composer.handle_key_event(key(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert!(redraw);
        assert_eq!(
            input,
            ComposerInput::PortfolioLinkInserted {
                slug: "boda-ana".to_string()
            }
        );
        assert_eq!(composer.canonical(), "Fotos: [[link_portafolio:boda-ana]] ");

        composer.record_short_link("boda-ana", "abc123");
        assert_eq!(composer.canonical(), "Fotos: [[link_portafolio:boda-ana]] ");
    }

    #[test]
    fn portfolio_shortcut_without_slug_reports_inline() {
        let mut composer = mounted();
        let (input, _) = composer.handle_key_event(key(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert_eq!(input, ComposerInput::None);
        assert!(composer.validation_error().is_some());
        assert_eq!(composer.canonical(), "");
    }

    #[test]
    fn alt_digits_insert_known_variables() {
        let mut composer = mounted();
        composer.handle_key_event(key(KeyCode::Char('3'), KeyModifiers::ALT));
        composer.handle_key_event(key(KeyCode::Char('9'), KeyModifiers::ALT));
        assert_eq!(composer.canonical(), "[[fecha_evento]] ");
    }

    #[test]
    fn remove_token_leaves_surrounding_text() {
        let mut composer = mounted();
        composer.set_canonical("Hola [[nombre_contacto]], el [[fecha_evento]] te esperamos");
        assert!(composer.remove_token(ChipRef(0)));
        assert_eq!(composer.canonical(), "Hola , el [[fecha_evento]] te esperamos");
        assert!(!composer.remove_token(ChipRef(1)));
        assert!(composer.remove_token(ChipRef(0)));
        assert_eq!(composer.canonical(), "Hola , el  te esperamos");
    }

    #[test]
    fn chip_selection_and_delete() {
        let mut composer = mounted();
        composer.set_canonical("[[nombre_contacto]] y [[nombre_evento]]");
        composer.handle_key_event(key(KeyCode::Left, KeyModifiers::CONTROL));
        assert_eq!(composer.selected_chip(), Some(ChipRef(1)));
        composer.handle_key_event(key(KeyCode::Left, KeyModifiers::CONTROL));
        composer.handle_key_event(key(KeyCode::Left, KeyModifiers::CONTROL));
        assert_eq!(composer.selected_chip(), Some(ChipRef(0)));

        let (_, redraw) = composer.handle_key_event(key(KeyCode::Delete, KeyModifiers::NONE));
        assert!(redraw);
        assert_eq!(composer.canonical(), " y [[nombre_evento]]");
        assert_eq!(composer.selected_chip(), None);
    }

    #[test]
    fn backspace_removes_trailing_chip_atomically() {
        let mut composer = mounted();
        composer.set_canonical("Hola [[nombre_contacto]]");
        composer.handle_key_event(key(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(composer.canonical(), "Hola ");
        composer.handle_key_event(key(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(composer.canonical(), "Hola");
    }

    #[test]
    fn enter_in_body_adds_newline_and_title_enter_moves_to_body() {
        let mut composer = mounted();
        composer.set_focus(Some(ComposerField::Title));
        type_str(&mut composer, "Saludo");
        composer.handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(composer.field(), ComposerField::Body);
        type_str(&mut composer, "Hola");
        composer.handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE));
        type_str(&mut composer, "chau");
        assert_eq!(composer.title(), "Saludo");
        assert_eq!(composer.canonical(), "Hola\nchau");
    }

    #[test]
    fn paste_normalizes_carriage_returns() {
        let mut composer = mounted();
        composer.handle_paste("uno\r\ndos\rtres".to_string());
        assert_eq!(composer.canonical(), "uno\ndos\ntres");
    }

    #[test]
    fn submission_requires_title_and_body() {
        let mut composer = mounted();
        type_str(&mut composer, "Hola");
        assert_eq!(composer.submission(), None);
        assert_eq!(
            composer.validation_error(),
            Some("Title must not be empty")
        );

        composer.set_title("Saludo");
        let submission = composer.submission().expect("valid submission");
        assert_eq!(
            submission,
            ComposerSubmission {
                id: None,
                title: "Saludo".to_string(),
                message: "Hola".to_string(),
            }
        );
        assert_eq!(composer.validation_error(), None);
    }

    #[test]
    fn load_template_hydrates_and_tracks_id() {
        let template = MessageTemplate {
            id: TemplateId::new(),
            title: "Recordatorio".to_string(),
            message: "Hola [[nombre_contacto]]\nNos vemos el [[fecha_evento]]".to_string(),
            order: 0,
        };
        let mut composer = mounted();
        composer.load_template(&template);
        assert_eq!(composer.canonical(), template.message);
        assert_eq!(composer.editing(), Some(template.id));
        assert_eq!(composer.surface().chip_count(), 2);

        composer.start_new();
        assert!(composer.is_empty());
        assert_eq!(composer.editing(), None);
    }

    #[test]
    fn renders_title_and_chip_labels() {
        let mut composer = mounted();
        composer.set_title("Saludo");
        composer.set_canonical("Hola [[nombre_contacto]]");
        let area = Rect::new(0, 0, 40, composer.desired_height(40));
        let mut buf = Buffer::empty(area);
        composer.render(area, &mut buf);

        let row = |y: u16| -> String {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().chars().next().unwrap_or(' '))
                .collect()
        };
        assert_eq!(row(0).trim_end(), "Title: Saludo");
        assert_eq!(row(2).trim_end(), "Hola  Nombre contacto");
    }
}
