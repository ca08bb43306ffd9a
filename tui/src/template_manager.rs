//! The template manager screen: template list, chip composer and live preview.
//!
//! Store and short-link calls never run on the UI task. Each one is handed to the blocking pool
//! and its result comes back as an [`AppEvent`], so a slow disk or a failing store only ever shows
//! up as a notice.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use itertools::Itertools as _;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Widget;
use studio_protocol::MessageTemplate;
use studio_protocol::TemplateId;
use studio_protocol::TenantId;
use studio_protocol::preview::LinkResolver;
use studio_protocol::preview::resolve_text;
use studio_protocol::segment::Segment;
use studio_protocol::store::ShortLinkProvider;
use studio_protocol::store::TemplateStore;
use studio_protocol::variables::VariableBindings;
use tokio::sync::mpsc::unbounded_channel;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::composer::ComposerField;
use crate::composer::ComposerInput;
use crate::composer::MessageComposer;
use crate::composer::PreviewPane;
use crate::notice::NOTICE_TTL;
use crate::notice::NoticeKind;
use crate::notice::NoticeLine;
use crate::render::Insets;
use crate::render::RectExt as _;
use crate::render::renderable::Renderable;
use crate::template_list::ListAction;
use crate::template_list::ReorderRequest;
use crate::template_list::TemplateListView;
use crate::tui::FrameRequester;
use crate::tui::Tui;
use crate::tui::TuiEvent;

/// Everything the manager needs from its embedder.
pub struct ManagerContext {
    pub tenant: TenantId,
    pub store: Arc<dyn TemplateStore>,
    pub short_links: Arc<dyn ShortLinkProvider>,
    pub bindings: VariableBindings,
    pub links: LinkResolver,
    /// Portfolio offered by <kbd>Ctrl</kbd>+<kbd>L</kbd>, if the session has one.
    pub portfolio_slug: Option<String>,
}

/// How the manager screen ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerExit {
    Quit,
    /// The user asked to send the composed message.
    Send {
        template_id: Option<TemplateId>,
        canonical: String,
        resolved: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Title,
    Body,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::List => Focus::Title,
            Focus::Title => Focus::Body,
            Focus::Body => Focus::List,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::List => Focus::Body,
            Focus::Title => Focus::List,
            Focus::Body => Focus::Title,
        }
    }

    fn composer_field(self) -> Option<ComposerField> {
        match self {
            Focus::List => None,
            Focus::Title => Some(ComposerField::Title),
            Focus::Body => Some(ComposerField::Body),
        }
    }
}

/// Run the manager until the user quits or sends.
pub async fn run_template_manager(
    tui: &mut Tui,
    ctx: ManagerContext,
) -> anyhow::Result<ManagerExit> {
    let (app_event_tx, mut app_event_rx) = unbounded_channel();
    let mut screen = TemplateManager::new(
        ctx,
        AppEventSender::new(app_event_tx),
        tui.frame_requester(),
    );
    screen.request_templates();
    tui.draw(|frame| screen.render_frame(frame))?;

    while screen.exit.is_none() {
        tokio::select! {
            maybe_event = tui.next_event() => {
                let Some(event) = maybe_event else {
                    break;
                };
                match event {
                    TuiEvent::Key(key_event) => screen.handle_key_event(key_event),
                    TuiEvent::Paste(pasted) => screen.handle_paste(pasted),
                    TuiEvent::Draw => {
                        screen.notice.expire(Instant::now());
                        tui.draw(|frame| screen.render_frame(frame))?;
                    }
                }
            }
            Some(event) = app_event_rx.recv() => screen.handle_app_event(event),
        }
    }

    tui.terminal.clear()?;
    Ok(screen.exit.take().unwrap_or(ManagerExit::Quit))
}

pub(crate) struct TemplateManager {
    tenant: TenantId,
    store: Arc<dyn TemplateStore>,
    short_links: Arc<dyn ShortLinkProvider>,
    bindings: VariableBindings,
    links: LinkResolver,
    app_event_tx: AppEventSender,
    frame_requester: FrameRequester,
    list: TemplateListView,
    composer: MessageComposer,
    focus: Focus,
    notice: NoticeLine,
    saving: bool,
    /// Slugs with a short-link lookup in flight or already answered.
    short_link_requests: HashSet<String>,
    select_after_load: Option<TemplateId>,
    reload_after_persist: bool,
    exit: Option<ManagerExit>,
}

impl TemplateManager {
    pub(crate) fn new(
        ctx: ManagerContext,
        app_event_tx: AppEventSender,
        frame_requester: FrameRequester,
    ) -> Self {
        let mut composer = MessageComposer::new();
        composer.set_mounted(true);
        composer.set_portfolio_slug(ctx.portfolio_slug);
        Self {
            tenant: ctx.tenant,
            store: ctx.store,
            short_links: ctx.short_links,
            bindings: ctx.bindings,
            links: ctx.links,
            app_event_tx,
            frame_requester,
            list: TemplateListView::default(),
            composer,
            focus: Focus::List,
            notice: NoticeLine::default(),
            saving: false,
            short_link_requests: HashSet::new(),
            select_after_load: None,
            reload_after_persist: false,
            exit: None,
        }
    }

    pub(crate) fn handle_key_event(&mut self, key_event: KeyEvent) {
        if key_event.kind == KeyEventKind::Release {
            return;
        }
        let redraw = match key_event {
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.exit = Some(ManagerExit::Quit);
                false
            }
            KeyEvent {
                code: KeyCode::Esc, ..
            } => self.handle_escape(),
            KeyEvent {
                code: KeyCode::Tab, ..
            } => self.set_focus(self.focus.next()),
            KeyEvent {
                code: KeyCode::BackTab,
                ..
            } => self.set_focus(self.focus.prev()),
            KeyEvent {
                code: KeyCode::Char('s'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.save(),
            KeyEvent {
                code: KeyCode::Char('e'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.send(),
            _ => match self.focus {
                Focus::List => {
                    let action = self.list.handle_key_event(key_event);
                    self.handle_list_action(action)
                }
                Focus::Title | Focus::Body => {
                    let (input, redraw) = self.composer.handle_key_event(key_event);
                    // Enter in the title moves the composer to the body.
                    if self.composer.field() == ComposerField::Body {
                        self.focus = Focus::Body;
                    }
                    if let ComposerInput::PortfolioLinkInserted { slug } = input {
                        self.request_short_link(slug);
                    }
                    redraw
                }
            },
        };
        if redraw {
            self.frame_requester.schedule_frame();
        }
    }

    pub(crate) fn handle_paste(&mut self, pasted: String) {
        if self.focus != Focus::List && self.composer.handle_paste(pasted) {
            self.frame_requester.schedule_frame();
        }
    }

    pub(crate) fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::TemplatesLoaded(Ok(templates)) => {
                if !self.list.set_templates(templates) {
                    tracing::debug!("deferring template reload until the reorder is persisted");
                    self.reload_after_persist = true;
                    return;
                }
                if let Some(id) = self.select_after_load.take() {
                    self.list.select(id);
                }
            }
            AppEvent::TemplatesLoaded(Err(err)) => {
                tracing::warn!("failed to load templates: {err}");
                self.show_notice(format!("Failed to load templates: {err}"), NoticeKind::Error);
            }
            AppEvent::TemplateSaved { result, created } => {
                self.saving = false;
                match result {
                    Ok(template) => {
                        self.composer.mark_saved(&template);
                        self.select_after_load = Some(template.id);
                        let text = if created {
                            "Template created"
                        } else {
                            "Template saved"
                        };
                        self.show_notice(text, NoticeKind::Info);
                        self.request_templates();
                    }
                    Err(err) => {
                        tracing::warn!("failed to save template: {err}");
                        self.show_notice(format!("Failed to save: {err}"), NoticeKind::Error);
                    }
                }
            }
            AppEvent::TemplateDeleted(Ok(id)) => {
                self.composer.forget_template(id);
                self.show_notice("Template deleted", NoticeKind::Info);
                self.request_templates();
            }
            AppEvent::TemplateDeleted(Err(err)) => {
                tracing::warn!("failed to delete template: {err}");
                self.show_notice(format!("Failed to delete: {err}"), NoticeKind::Error);
            }
            AppEvent::ReorderPersisted(Ok(())) => {
                self.list.commit_reorder();
                if std::mem::take(&mut self.reload_after_persist) {
                    self.request_templates();
                }
            }
            AppEvent::ReorderPersisted(Err(err)) => {
                tracing::warn!("failed to persist template order: {err}");
                self.list.rollback_reorder();
                self.show_notice(
                    format!("Could not save the new order, restored the previous one: {err}"),
                    NoticeKind::Error,
                );
                if std::mem::take(&mut self.reload_after_persist) {
                    self.request_templates();
                }
            }
            AppEvent::ShortLinkResolved { slug, result } => match result {
                Ok(link) => {
                    self.composer.record_short_link(slug, link.code.clone());
                    self.links.insert_short_code(link.slug, link.code);
                }
                Err(err) => {
                    tracing::warn!("short link lookup for {slug} failed: {err}");
                }
            },
        }
        self.frame_requester.schedule_frame();
    }

    pub(crate) fn request_templates(&self) {
        let store = Arc::clone(&self.store);
        let tenant = self.tenant.clone();
        self.spawn_blocking(move || {
            AppEvent::TemplatesLoaded(store.list(&tenant).map_err(|err| err.to_string()))
        });
    }

    fn handle_escape(&mut self) -> bool {
        if self.focus == Focus::List && self.list.is_dragging() {
            let action = self
                .list
                .handle_key_event(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
            return self.handle_list_action(action);
        }
        if self.composer.clear_chip_selection() {
            return true;
        }
        self.exit = Some(ManagerExit::Quit);
        false
    }

    fn set_focus(&mut self, focus: Focus) -> bool {
        if self.list.is_dragging() {
            return false;
        }
        self.focus = focus;
        self.composer.set_focus(focus.composer_field());
        true
    }

    fn handle_list_action(&mut self, action: ListAction) -> bool {
        match action {
            ListAction::None => false,
            ListAction::Redraw => true,
            ListAction::Load(id) => {
                let Some(template) = self
                    .list
                    .templates()
                    .iter()
                    .find(|template| template.id == id)
                    .cloned()
                else {
                    return false;
                };
                self.composer.load_template(&template);
                self.request_missing_short_links();
                self.set_focus(Focus::Body)
            }
            ListAction::NewTemplate => {
                self.composer.start_new();
                self.set_focus(Focus::Title)
            }
            ListAction::Delete(id) => {
                self.delete(id);
                false
            }
            ListAction::Persist(request) => {
                self.persist_order(request);
                true
            }
        }
    }

    fn save(&mut self) -> bool {
        if self.saving {
            self.show_notice("Still saving the previous change", NoticeKind::Info);
            return true;
        }
        let Some(submission) = self.composer.submission() else {
            return true;
        };
        self.saving = true;
        let store = Arc::clone(&self.store);
        let tenant = self.tenant.clone();
        self.spawn_blocking(move || match submission.id {
            Some(id) => AppEvent::TemplateSaved {
                result: store
                    .update(&tenant, &id, &submission.title, &submission.message)
                    .map_err(|err| err.to_string()),
                created: false,
            },
            None => AppEvent::TemplateSaved {
                result: store
                    .create(&tenant, &submission.title, &submission.message)
                    .map_err(|err| err.to_string()),
                created: true,
            },
        });
        true
    }

    fn delete(&self, id: TemplateId) {
        let store = Arc::clone(&self.store);
        let tenant = self.tenant.clone();
        self.spawn_blocking(move || {
            AppEvent::TemplateDeleted(
                store
                    .delete(&tenant, &id)
                    .map(|()| id)
                    .map_err(|err| err.to_string()),
            )
        });
    }

    fn persist_order(&self, request: ReorderRequest<TemplateId>) {
        let store = Arc::clone(&self.store);
        let tenant = self.tenant.clone();
        self.spawn_blocking(move || {
            AppEvent::ReorderPersisted(
                store
                    .reorder(&tenant, &request.ordered_ids)
                    .map_err(|err| err.to_string()),
            )
        });
    }

    fn send(&mut self) -> bool {
        let canonical = self.composer.canonical();
        if canonical.trim().is_empty() {
            self.show_notice("Nothing to send yet", NoticeKind::Error);
            return true;
        }
        let resolved = resolve_text(&canonical, &self.bindings, &self.links);
        self.exit = Some(ManagerExit::Send {
            template_id: self.composer.editing(),
            canonical,
            resolved,
        });
        false
    }

    fn request_missing_short_links(&mut self) {
        let slugs: Vec<String> = self
            .composer
            .segments()
            .iter()
            .filter_map(|segment| match segment {
                Segment::PortfolioLink { slug } => Some(slug.clone()),
                _ => None,
            })
            .unique()
            .collect();
        for slug in slugs {
            self.request_short_link(slug);
        }
    }

    fn request_short_link(&mut self, slug: String) {
        if let Some(code) = self.links.short_code(&slug) {
            self.composer.record_short_link(slug, code);
            return;
        }
        if !self.short_link_requests.insert(slug.clone()) {
            return;
        }
        let short_links = Arc::clone(&self.short_links);
        let tenant = self.tenant.clone();
        self.spawn_blocking(move || AppEvent::ShortLinkResolved {
            result: short_links
                .get_or_create_short_link(&tenant, &slug)
                .map_err(|err| err.to_string()),
            slug,
        });
    }

    fn spawn_blocking(&self, call: impl FnOnce() -> AppEvent + Send + 'static) {
        let tx = self.app_event_tx.clone();
        tokio::task::spawn_blocking(move || tx.send(call()));
    }

    fn show_notice(&mut self, text: impl Into<String>, kind: NoticeKind) {
        self.notice.show(text, kind, Instant::now());
        self.frame_requester.schedule_frame_in(NOTICE_TTL);
    }

    fn footer_hint(&self) -> Line<'static> {
        let hint = match self.focus {
            Focus::List if self.list.is_dragging() => "↑/↓ move · space drop · esc cancel",
            Focus::List => {
                "space move · enter open · n new · d delete · tab edit · ctrl+e send · esc quit"
            }
            Focus::Title => "enter body · tab switch · ctrl+s save · esc quit",
            Focus::Body => {
                "alt+1..4 variable · ctrl+l portfolio · ctrl+←/→ chip · del remove · ctrl+s save"
            }
        };
        Line::from(hint.dim())
    }

    fn panes(area: Rect) -> Panes {
        let [main, notice, footer] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);
        let [list, right] =
            Layout::horizontal([Constraint::Percentage(35), Constraint::Fill(1)]).areas(main);
        let [composer, preview] =
            Layout::vertical([Constraint::Percentage(60), Constraint::Fill(1)]).areas(right);
        Panes {
            list,
            composer,
            preview,
            notice,
            footer,
        }
    }

    fn pane_block(&self, title: &'static str, focused: bool) -> Block<'static> {
        let style = if focused {
            Style::default().cyan()
        } else {
            Style::default().dim()
        };
        Block::bordered().title(title).border_style(style)
    }

    /// Inside of a pane's border, with one column of padding on each side for text panes.
    fn padded_inner(block: &Block<'_>, area: Rect) -> Rect {
        block.inner(area).inset(Insets::tlbr(0, 1, 0, 1))
    }

    pub(crate) fn render_frame(&self, frame: &mut Frame) {
        let area = frame.area();
        self.render(area, frame.buffer_mut());
        if let Some(pos) = self.cursor_pos(area) {
            frame.set_cursor_position(pos);
        }
    }
}

struct Panes {
    list: Rect,
    composer: Rect,
    preview: Rect,
    notice: Rect,
    footer: Rect,
}

impl Renderable for TemplateManager {
    fn desired_height(&self, _width: u16) -> u16 {
        u16::MAX
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let panes = Self::panes(area);

        let list_block = self.pane_block(" Templates ", self.focus == Focus::List);
        let list_inner = list_block.inner(panes.list);
        list_block.render(panes.list, buf);
        self.list.render(list_inner, buf);

        let composer_title = match self.composer.editing() {
            Some(_) => " Edit template ",
            None => " New template ",
        };
        let composer_block = self.pane_block(composer_title, self.focus != Focus::List);
        let composer_inner = Self::padded_inner(&composer_block, panes.composer);
        composer_block.render(panes.composer, buf);
        self.composer.render(composer_inner, buf);

        let preview_block = self.pane_block(" Preview ", false);
        let preview_inner = Self::padded_inner(&preview_block, panes.preview);
        preview_block.render(panes.preview, buf);
        PreviewPane::new(&self.composer.canonical(), &self.bindings, &self.links)
            .render(preview_inner, buf);

        self.notice.line().render(panes.notice, buf);
        self.footer_hint().render(panes.footer, buf);
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if self.focus == Focus::List {
            return None;
        }
        let panes = Self::panes(area);
        let inner = Self::padded_inner(&Block::bordered(), panes.composer);
        self.composer.cursor_pos(inner)
    }
}
