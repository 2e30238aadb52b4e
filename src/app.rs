//! Application state and core logic.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::style::Color;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use tracing::{debug, info};

use crate::config::{Config, ConfigLoadStatus, LoadedConfig, StartView};
use crate::form::{FormState, handle_form_input};
use crate::generator::GeneratorKind;
use crate::output::{self, Clipboard};
use crate::presets::{self, KeyValueStore};
use crate::templates;

/// How long a toast stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// The two top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Bug, story, task and epic tabs.
    Ticket,
    /// Verified comment generator.
    Comment,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Ticket => "Ticket Templates",
            View::Comment => "Verified Comment Generator",
        }
    }
}

impl From<StartView> for View {
    fn from(start: StartView) -> Self {
        match start {
            StartView::Ticket => View::Ticket,
            StartView::Comment => View::Comment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn color(&self) -> Color {
        match self {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
            ToastKind::Info => Color::Cyan,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ToastKind::Success => "Done",
            ToastKind::Error => "Error",
            ToastKind::Info => "Info",
        }
    }
}

/// A short-lived notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub shown_at: Instant,
}

/// Main application state.
pub struct App {
    pub view: View,
    /// Selected tab in the ticket view.
    pub ticket_kind: GeneratorKind,
    /// One isolated form per generator kind.
    pub forms: HashMap<GeneratorKind, FormState>,
    pub preview_scroll: u16,
    /// Inner size of the preview pane, updated on every draw.
    pub preview_width: u16,
    pub preview_height: u16,
    pub toast: Option<Toast>,
    pub should_quit: bool,
    /// Session ID for this invocation.
    pub session_id: Option<String>,
    /// Error that occurred during logging initialization.
    pub logging_error: Option<String>,
    pub config: Config,
    pub config_path: PathBuf,
    pub config_load_status: ConfigLoadStatus,
    store: Box<dyn KeyValueStore>,
    clipboard: Box<dyn Clipboard>,
}

impl App {
    pub fn new(
        loaded_config: LoadedConfig,
        store: Box<dyn KeyValueStore>,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        let config = loaded_config.config;
        let view = View::from(config.behavior.start_view);
        let ticket_kind = config.behavior.default_ticket_kind();
        let mut app = Self {
            view,
            ticket_kind,
            forms: HashMap::new(),
            preview_scroll: 0,
            preview_width: 0,
            preview_height: 0,
            toast: None,
            should_quit: false,
            session_id: None,
            logging_error: None,
            config,
            config_path: loaded_config.config_path,
            config_load_status: loaded_config.status,
            store,
            clipboard,
        };
        app.mount_view(view);
        app
    }

    /// Generator whose form and preview are on screen.
    pub fn active_kind(&self) -> GeneratorKind {
        match self.view {
            View::Ticket => self.ticket_kind,
            View::Comment => GeneratorKind::VerifiedComment,
        }
    }

    pub fn active_form(&self) -> Option<&FormState> {
        self.forms.get(&self.active_kind())
    }

    pub fn active_form_mut(&mut self) -> Option<&mut FormState> {
        let kind = self.active_kind();
        self.forms.get_mut(&kind)
    }

    /// The report for the active form, rendered fresh.
    pub fn rendered(&self) -> String {
        self.active_form()
            .map(|form| templates::render(form.kind(), &form.fields))
            .unwrap_or_default()
    }

    /// Fresh forms for every generator in `view`, seeded from presets.
    fn mount_view(&mut self, view: View) {
        let kinds: &[GeneratorKind] = match view {
            View::Ticket => &GeneratorKind::TICKETS,
            View::Comment => &[GeneratorKind::VerifiedComment],
        };
        self.forms.clear();
        for &kind in kinds {
            let record = presets::load(self.store.as_ref(), kind);
            let presets = (!record.is_empty()).then_some(&record);
            self.forms.insert(kind, FormState::new(kind, presets));
        }
        debug!(view = ?view, "view_mounted");
    }

    /// Switch views. Leaving a view discards its unsaved input.
    pub fn switch_view(&mut self, view: View) {
        if self.view == view {
            return;
        }
        info!(from = ?self.view, to = ?view, "view_switched");
        self.view = view;
        self.preview_scroll = 0;
        self.mount_view(view);
    }

    /// Show the ticket view on the given tab. Tabs keep their input.
    pub fn select_ticket(&mut self, kind: GeneratorKind) {
        if !kind.is_ticket() {
            return;
        }
        self.switch_view(View::Ticket);
        if self.ticket_kind != kind {
            debug!(kind = %kind, "ticket_selected");
            self.ticket_kind = kind;
            self.preview_scroll = 0;
        }
    }

    pub fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toast = Some(Toast {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
        });
    }

    /// Drop the toast once it has been visible long enough.
    pub fn expire_toast(&mut self) {
        if let Some(toast) = &self.toast
            && toast.shown_at.elapsed() >= TOAST_DURATION
        {
            self.toast = None;
        }
    }

    /// Copy the rendered report to the clipboard.
    pub fn copy_report(&mut self) {
        let text = self.rendered();
        match output::copy_to_clipboard(self.clipboard.as_mut(), &text) {
            Ok(()) => self.notify(ToastKind::Success, "Copied to clipboard"),
            Err(e) => self.notify(ToastKind::Error, e.to_string()),
        }
    }

    /// Save the rendered report into the downloads directory.
    pub fn save_report(&mut self) {
        let text = self.rendered();
        let filename = self.active_kind().export_filename();
        let dir = self.config.downloads_path();
        match output::download_as_file(&dir, &filename, &text) {
            Ok(path) => self.notify(ToastKind::Success, format!("Saved {}", path.display())),
            Err(e) => self.notify(ToastKind::Error, e.to_string()),
        }
    }

    /// Persist the active form's preset fields.
    pub fn save_presets(&mut self) {
        let Some(form) = self.forms.get(&self.active_kind()) else {
            return;
        };
        match presets::save(self.store.as_mut(), &form.fields) {
            Ok(()) => self.notify(ToastKind::Success, "Presets saved"),
            Err(e) => self.notify(ToastKind::Error, e.to_string()),
        }
    }

    /// Clear the active form back to defaults and saved presets.
    pub fn reset_form(&mut self) {
        let kind = self.active_kind();
        let record = presets::load(self.store.as_ref(), kind);
        let presets = (!record.is_empty()).then_some(&record);
        if let Some(form) = self.forms.get_mut(&kind) {
            form.reset(presets);
            self.notify(ToastKind::Info, "Form cleared");
        }
    }

    pub fn scroll_preview_up(&mut self, amount: u16) {
        self.preview_scroll = self.preview_scroll.saturating_sub(amount);
    }

    /// Rows the preview takes once wrapped to the pane width.
    pub fn preview_line_count(&self) -> u16 {
        if self.preview_width == 0 {
            return 0;
        }
        let rendered = self.rendered();
        let content: Vec<Line> = rendered.split('\n').map(Line::raw).collect();
        let paragraph = Paragraph::new(content).wrap(Wrap { trim: false });
        paragraph.line_count(self.preview_width).min(u16::MAX as usize) as u16
    }

    fn max_preview_scroll(&self) -> u16 {
        self.preview_line_count().saturating_sub(self.preview_height)
    }

    pub fn scroll_preview_down(&mut self, amount: u16) {
        let max = self.max_preview_scroll();
        self.preview_scroll = self.preview_scroll.saturating_add(amount).min(max);
    }

    /// Handle one key press: global shortcuts first, then form editing.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::F(1) => self.select_ticket(GeneratorKind::Bug),
            KeyCode::F(2) => self.select_ticket(GeneratorKind::Story),
            KeyCode::F(3) => self.select_ticket(GeneratorKind::Task),
            KeyCode::F(4) => self.select_ticket(GeneratorKind::Epic),
            KeyCode::F(5) => self.switch_view(View::Comment),
            KeyCode::Char('y') if ctrl => self.copy_report(),
            KeyCode::Char('s') if ctrl => self.save_report(),
            KeyCode::Char('p') if ctrl => self.save_presets(),
            KeyCode::Char('r') if ctrl => self.reset_form(),
            KeyCode::PageUp => self.scroll_preview_up(5),
            KeyCode::PageDown => self.scroll_preview_down(5),
            _ => {
                if let Some(form) = self.active_form_mut() {
                    handle_form_input(form, code, modifiers);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedClipboard {
        contents: Rc<RefCell<Option<String>>>,
        fail: bool,
    }

    impl Clipboard for SharedClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), String> {
            if self.fail {
                return Err("permission denied".to_string());
            }
            *self.contents.borrow_mut() = Some(text.to_string());
            Ok(())
        }
    }

    fn loaded(config: Config) -> LoadedConfig {
        LoadedConfig {
            config,
            config_path: PathBuf::from("config.toml"),
            project_config_path: None,
            status: ConfigLoadStatus::Loaded,
        }
    }

    fn app_with(store: MemoryStore, clipboard: SharedClipboard) -> App {
        App::new(loaded(Config::default()), Box::new(store), Box::new(clipboard))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_starts_on_configured_ticket() {
        let mut config = Config::default();
        config.behavior.default_ticket = "story".to_string();
        let app = App::new(
            loaded(config),
            Box::new(MemoryStore::default()),
            Box::new(SharedClipboard::default()),
        );
        assert_eq!(app.view, View::Ticket);
        assert_eq!(app.active_kind(), GeneratorKind::Story);
        assert_eq!(app.forms.len(), 4);
    }

    #[test]
    fn test_starts_on_comment_view() {
        let mut config = Config::default();
        config.behavior.start_view = StartView::Comment;
        let app = App::new(
            loaded(config),
            Box::new(MemoryStore::default()),
            Box::new(SharedClipboard::default()),
        );
        assert_eq!(app.active_kind(), GeneratorKind::VerifiedComment);
        assert!(app.rendered().contains("{color:green}Pass{color}"));
    }

    #[test]
    fn test_ticket_tabs_keep_isolated_input() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        app.select_ticket(GeneratorKind::Task);
        type_str(&mut app, "task summary");
        app.handle_key(KeyCode::F(4), KeyModifiers::NONE);
        assert_eq!(app.active_kind(), GeneratorKind::Epic);
        assert!(app.rendered().starts_with("*Summary:* \n"));

        app.handle_key(KeyCode::F(3), KeyModifiers::NONE);
        assert!(app.rendered().starts_with("*Summary:* task summary\n"));
    }

    #[test]
    fn test_switching_views_discards_input() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        type_str(&mut app, "bug summary");
        app.handle_key(KeyCode::F(5), KeyModifiers::NONE);
        app.handle_key(KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(app.active_form().unwrap().fields.get("summary"), "");
    }

    #[test]
    fn test_copy_report_success() {
        let clipboard = SharedClipboard::default();
        let contents = clipboard.contents.clone();
        let mut app = app_with(MemoryStore::default(), clipboard);
        type_str(&mut app, "Login fails");
        app.handle_key(KeyCode::Char('y'), KeyModifiers::CONTROL);

        let copied = contents.borrow().clone().unwrap();
        assert!(copied.starts_with("*Summary:* Login fails\n"));
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Success);
    }

    #[test]
    fn test_copy_report_failure_shows_error() {
        let clipboard = SharedClipboard {
            fail: true,
            ..Default::default()
        };
        let mut app = app_with(MemoryStore::default(), clipboard);
        app.copy_report();
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.message.contains("permission denied"));
    }

    #[test]
    fn test_save_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.downloads = dir.path().display().to_string();
        let mut app = App::new(
            loaded(config),
            Box::new(MemoryStore::default()),
            Box::new(SharedClipboard::default()),
        );
        app.select_ticket(GeneratorKind::Epic);
        type_str(&mut app, "Payments v2");
        app.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL);

        let written = std::fs::read_to_string(dir.path().join("epic-ticket.txt")).unwrap();
        assert_eq!(written, app.rendered());
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Success);
    }

    #[test]
    fn test_presets_saved_and_seed_next_mount() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        app.switch_view(View::Comment);
        {
            let form = app.active_form_mut().unwrap();
            form.fields.set("environment", "Staging").unwrap();
            form.fields.set("summary", "not kept").unwrap();
        }
        app.handle_key(KeyCode::Char('p'), KeyModifiers::CONTROL);
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Success);

        app.switch_view(View::Ticket);
        app.switch_view(View::Comment);
        let form = app.active_form().unwrap();
        assert_eq!(form.fields.get("environment"), "Staging");
        assert_eq!(form.fields.get("summary"), "");
    }

    #[test]
    fn test_presets_on_ticket_view_reports_error() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        app.save_presets();
        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "bug has no presets");
    }

    #[test]
    fn test_malformed_presets_do_not_block_mount() {
        let mut store = MemoryStore::default();
        store.set("verified-comment-presets", "not json").unwrap();
        let mut app = app_with(store, SharedClipboard::default());
        app.switch_view(View::Comment);
        assert_eq!(app.active_form().unwrap().fields.get("environment"), "");
    }

    #[test]
    fn test_reset_form_clears_input() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        type_str(&mut app, "draft");
        app.handle_key(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(app.active_form().unwrap().fields.get("summary"), "");
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);

        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        type_str(&mut app, "q");
        assert!(!app.should_quit);
        app.handle_key(KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.should_quit);
    }

    #[test]
    fn test_toast_expires() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        app.notify(ToastKind::Info, "hello");
        app.expire_toast();
        assert!(app.toast.is_some());

        app.toast.as_mut().unwrap().shown_at = Instant::now() - TOAST_DURATION;
        app.expire_toast();
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_preview_scroll_is_bounded() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        app.preview_width = 40;
        app.preview_height = 5;
        app.scroll_preview_up(3);
        assert_eq!(app.preview_scroll, 0);
        app.scroll_preview_down(500);
        assert_eq!(app.preview_scroll, app.preview_line_count() - 5);

        app.preview_scroll = u16::MAX - 1;
        app.scroll_preview_down(10);
        assert_eq!(app.preview_scroll, app.preview_line_count() - 5);
    }

    #[test]
    fn test_preview_scroll_reaches_wrapped_tail() {
        let mut app = app_with(MemoryStore::default(), SharedClipboard::default());
        app.switch_view(View::Comment);
        let link = format!("https://jira.example.com/secure/Tests?id={}", "9".repeat(80));
        app.active_form_mut()
            .unwrap()
            .fields
            .set("testExecutionLink", link)
            .unwrap();
        app.preview_width = 20;
        app.preview_height = 10;

        let source_lines = app.rendered().split('\n').count() as u16;
        assert!(app.preview_line_count() > source_lines);

        app.scroll_preview_down(u16::MAX);
        assert_eq!(app.preview_scroll, app.preview_line_count() - 10);
        assert!(app.preview_scroll > source_lines - 10);
    }
}
