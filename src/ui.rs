//! UI rendering functions.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation,
    ScrollbarState, Wrap,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, View};
use crate::config::ConfigLoadStatus;
use crate::form::FormState;
use crate::generator::{FieldKind, GeneratorKind};

const FOCUS_COLOR: Color = Color::Yellow;

/// Contract a path by replacing the home directory with `~` for display.
pub fn contract_path(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(suffix) = path.strip_prefix(&home)
    {
        return format!("~/{}", suffix.display());
    }
    path.display().to_string()
}

/// Calculate a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Split `text` at char `cursor`, highlighting the char under it.
///
/// A cursor past the end highlights a trailing space.
pub fn cursor_spans(text: &str, cursor: usize) -> Vec<Span<'static>> {
    let before: String = text.chars().take(cursor).collect();
    let mut rest = text.chars().skip(cursor);
    let under = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
    let after: String = rest.collect();

    let mut spans = Vec::with_capacity(3);
    if !before.is_empty() {
        spans.push(Span::raw(before));
    }
    spans.push(Span::styled(
        under,
        Style::default().add_modifier(Modifier::REVERSED),
    ));
    if !after.is_empty() {
        spans.push(Span::raw(after));
    }
    spans
}

/// Lines for the form pane, plus the line range of the focused field.
pub fn form_lines(form: &FormState) -> (Vec<Line<'static>>, usize, usize) {
    let mut lines = Vec::new();
    let mut focus_start = 0;
    let mut focus_end = 0;
    let placeholder_style = Style::default().fg(Color::DarkGray);

    for (index, descriptor) in form.kind().fields().iter().enumerate() {
        let focused = index == form.focus;
        if focused {
            focus_start = lines.len();
        }

        let label_style = if focused {
            Style::default().fg(FOCUS_COLOR).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let marker = if focused { "▶ " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(FOCUS_COLOR)),
            Span::styled(descriptor.label, label_style),
        ]));

        let value = form.fields.get(descriptor.id);
        match descriptor.kind {
            FieldKind::Choice => {
                let style = if focused {
                    Style::default().fg(FOCUS_COLOR)
                } else {
                    Style::default()
                };
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("< {} >", value), style),
                ]));
            }
            FieldKind::SingleLine | FieldKind::MultiLine => {
                if value.is_empty() && !focused {
                    let hint = descriptor.placeholder.unwrap_or("");
                    lines.push(Line::from(vec![
                        Span::raw("    "),
                        Span::styled(hint, placeholder_style),
                    ]));
                } else {
                    let mut offset = 0;
                    for segment in value.split('\n') {
                        let len = segment.chars().count();
                        let mut spans = vec![Span::raw("    ")];
                        if focused && form.cursor >= offset && form.cursor <= offset + len {
                            spans.extend(cursor_spans(segment, form.cursor - offset));
                        } else {
                            spans.push(Span::raw(segment.to_string()));
                        }
                        lines.push(Line::from(spans));
                        offset += len + 1;
                    }
                }
            }
        }

        if focused {
            focus_end = lines.len();
        }
        lines.push(Line::raw(""));
    }

    (lines, focus_start, focus_end)
}

/// Scroll offset that keeps the end of the focused field in view.
pub fn form_scroll(focus_end: usize, height: u16) -> u16 {
    let height = height as usize;
    if height == 0 || focus_end <= height {
        return 0;
    }
    (focus_end - height) as u16
}

/// Header line listing the generators reachable from the current view.
fn tab_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    let keys = ["F1", "F2", "F3", "F4", "F5"];
    for (key, kind) in keys.iter().zip(GeneratorKind::ALL) {
        let active = app.active_kind() == kind;
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(FOCUS_COLOR)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} {} ", key, kind.title()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Draw the main UI.
pub fn draw_ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs (border + 1 content row + border)
            Constraint::Min(1),    // Form and preview
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    let header = Paragraph::new(tab_line(app)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(Line::from(format!(" {} ", app.view.title())).left_aligned()),
    );
    f.render_widget(header, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    // Preview dimensions drive scroll bounds
    app.preview_width = panes[1].width.saturating_sub(2);
    app.preview_height = panes[1].height.saturating_sub(2);

    draw_form(f, app, panes[0]);
    draw_preview(f, app, panes[1]);
    draw_footer(f, app, chunks[2]);

    if app.toast.is_some() {
        draw_toast(f, app);
    }
}

fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let Some(form) = app.active_form() else {
        return;
    };
    let (lines, _, focus_end) = form_lines(form);
    let scroll = form_scroll(focus_end, area.height.saturating_sub(2));

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(FOCUS_COLOR))
        .title(Line::from(format!(" {} ", form.kind().title())).left_aligned());
    if let Some(hint) = form.focused().placeholder
        && form.focused().kind != FieldKind::Choice
    {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" {} ", hint.replace('\n', " ")),
                Style::default().fg(Color::DarkGray),
            ))
            .left_aligned(),
        );
    }

    let panel = Paragraph::new(lines).block(block).scroll((scroll, 0));
    f.render_widget(panel, area);
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let rendered = app.rendered();
    let line_count = app.preview_line_count() as usize;
    let content: Vec<Line> = rendered.split('\n').map(Line::raw).collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Line::from(" Preview ").left_aligned())
        .title(Line::from(format!(" {} ", app.active_kind().export_filename())).right_aligned());

    let preview = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));
    f.render_widget(preview, area);

    let viewport = area.height.saturating_sub(2) as usize;
    if line_count > viewport {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(line_count)
            .position(app.preview_scroll as usize)
            .viewport_content_length(viewport);
        f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.view {
        View::Ticket => "[^Y] Copy  [^S] Save  [^R] Clear  [PgUp/PgDn] Scroll  [Esc] Quit",
        View::Comment => {
            "[^Y] Copy  [^S] Save  [^P] Presets  [^R] Clear  [PgUp/PgDn] Scroll  [Esc] Quit"
        }
    };

    let (status_text, status_color) = if let ConfigLoadStatus::Error(_) = app.config_load_status {
        (
            format!("config error: {}", contract_path(&app.config_path)),
            Color::Red,
        )
    } else if let Some(err) = &app.logging_error {
        (format!("logging disabled: {}", err), Color::Red)
    } else {
        (
            app.session_id.clone().unwrap_or_default(),
            Color::DarkGray,
        )
    };

    let width = area.width as usize;
    let spacing = width.saturating_sub(shortcuts.width() + status_text.width());
    let line = Line::from(vec![
        Span::styled(shortcuts, Style::default().fg(Color::DarkGray)),
        Span::raw(" ".repeat(spacing)),
        Span::styled(status_text, Style::default().fg(status_color)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_toast(f: &mut Frame, app: &App) {
    let Some(toast) = &app.toast else {
        return;
    };
    let width = (toast.message.width() as u16 + 4).max(24);
    let area = centered_rect(width, 3, f.area());
    f.render_widget(Clear, area);
    let popup = Paragraph::new(toast.message.as_str())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", toast.kind.title()))
                .style(Style::default().fg(toast.kind.color())),
        );
    f.render_widget(popup, area);
}
