mod app;
mod cli;
mod config;
mod fields;
mod form;
mod generator;
mod logging;
mod output;
mod presets;
mod templates;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{DefaultTerminal, Terminal};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::cli::{PresetsAction, RenderArgs};
use crate::config::{LoadedConfig, StartView};
use crate::generator::GeneratorKind;
use crate::output::SystemClipboard;
use crate::presets::FileStore;
use crate::ui::draw_ui;

#[derive(Debug, Parser)]
#[command(
    name = "jiragen",
    version,
    about = "Generate Jira ticket descriptions and verification comments"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the interactive editor (default)
    Tui {
        /// View to open on
        #[arg(long, value_enum)]
        view: Option<StartView>,
        /// Generator to select on start
        #[arg(long)]
        kind: Option<GeneratorKind>,
    },
    /// Render a report without the TUI
    Render(RenderArgs),
    /// Print a generator's fields as JSON
    Fields {
        kind: GeneratorKind,
    },
    /// Inspect or edit the verified comment presets
    Presets {
        #[command(subcommand)]
        action: PresetsAction,
    },
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    // Initialize logging before anything else
    let (session_id, log_directory, logging_error, reload_handle, _guard) = match logging::init()
    {
        Ok(ctx) => (
            Some(ctx.session_id),
            Some(ctx.log_directory),
            None,
            Some(ctx.reload_handle),
            Some(ctx._guard),
        ),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            (None, None, Some(e.message), None, None)
        }
    };

    let mut loaded_config = config::load_config();
    debug!(
        config_path = %loaded_config.config_path.display(),
        project_config = ?loaded_config.project_config_path,
        status = ?loaded_config.status,
        "config_loaded"
    );

    if let Some(handle) = &reload_handle
        && let Err(e) = logging::update_log_level(handle, &loaded_config.config.logging.level)
    {
        warn!(error = %e, "log_level_not_applied");
    }
    if let Some(dir) = &log_directory {
        logging::cleanup_old_logs(dir);
    }

    let presets_dir = loaded_config.config.presets_path();
    let result = match cli.command {
        None => run_tui(loaded_config, session_id.clone(), logging_error),
        Some(Command::Tui { view, kind }) => {
            apply_start_overrides(&mut loaded_config, view, kind);
            run_tui(loaded_config, session_id.clone(), logging_error)
        }
        Some(Command::Render(args)) => {
            let store = FileStore::new(presets_dir);
            let mut clipboard = SystemClipboard::holding();
            cli::run_render(&args, &store, &mut clipboard, &mut io::stdout())
        }
        Some(Command::Fields { kind }) => cli::run_fields(kind, &mut io::stdout()),
        Some(Command::Presets { action }) => {
            let mut store = FileStore::new(presets_dir);
            debug!(presets_dir = ?store.dir(), "presets_command");
            cli::run_presets(&action, &mut store, &mut io::stdout())
        }
    };

    if let Some(sid) = session_id {
        let duration = start_time.elapsed();
        info!(
            session_id = %sid,
            duration_secs = duration.as_secs_f64(),
            "session_end"
        );
    }

    result
}

/// Apply `tui --view/--kind` over the configured start state.
fn apply_start_overrides(
    loaded_config: &mut LoadedConfig,
    view: Option<StartView>,
    kind: Option<GeneratorKind>,
) {
    let behavior = &mut loaded_config.config.behavior;
    if let Some(kind) = kind {
        if kind.is_ticket() {
            behavior.default_ticket = kind.id().to_string();
            behavior.start_view = StartView::Ticket;
        } else {
            behavior.start_view = StartView::Comment;
        }
    }
    if let Some(view) = view {
        behavior.start_view = view;
    }
}

fn run_tui(
    loaded_config: LoadedConfig,
    session_id: Option<String>,
    logging_error: Option<String>,
) -> Result<()> {
    let store = FileStore::new(loaded_config.config.presets_path());
    debug!(presets_dir = ?store.dir(), "tui_start");
    let mut app = App::new(
        loaded_config,
        Box::new(store),
        Box::new(SystemClipboard::default()),
    );
    app.session_id = session_id;
    app.logging_error = logging_error;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

    let result = run_app(terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;

    result
}

fn run_app(mut terminal: DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        app.expire_toast();

        terminal.draw(|f| draw_ui(f, app))?;

        // Short timeout so toasts expire without input
        if crossterm::event::poll(Duration::from_millis(50))? {
            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key.code, key.modifiers);
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.scroll_preview_up(3),
                    MouseEventKind::ScrollDown => app.scroll_preview_down(3),
                    _ => {}
                },
                _ => {}
            }
        }

        if app.should_quit {
            info!("quit_requested");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigLoadStatus};

    fn loaded() -> LoadedConfig {
        LoadedConfig {
            config: Config::default(),
            config_path: "config.toml".into(),
            project_config_path: None,
            status: ConfigLoadStatus::Loaded,
        }
    }

    #[test]
    fn test_cli_defaults_to_tui() {
        let cli = Cli::try_parse_from(["jiragen"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from([
            "jiragen",
            "render",
            "verified",
            "--set",
            "status=fail",
            "--no-presets",
        ])
        .unwrap();
        let Some(Command::Render(args)) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.kind, GeneratorKind::VerifiedComment);
        assert_eq!(args.set, vec![("status".to_string(), "fail".to_string())]);
        assert!(args.no_presets);
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["jiragen", "fields", "incident"]).is_err());
    }

    #[test]
    fn test_start_overrides() {
        let mut config = loaded();
        apply_start_overrides(&mut config, None, Some(GeneratorKind::Epic));
        assert_eq!(config.config.behavior.start_view, StartView::Ticket);
        assert_eq!(config.config.behavior.default_ticket, "epic");

        apply_start_overrides(&mut config, None, Some(GeneratorKind::VerifiedComment));
        assert_eq!(config.config.behavior.start_view, StartView::Comment);

        apply_start_overrides(&mut config, Some(StartView::Ticket), None);
        assert_eq!(config.config.behavior.start_view, StartView::Ticket);
    }
}
